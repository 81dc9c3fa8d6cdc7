/// One audited Cake release: the version addins are compared against and
/// the framework(s) they are expected to target for that release.
#[derive(Debug, Clone, Copy)]
pub struct CakeVersion {
    pub version: &'static str,
    pub required_framework: &'static str,
    pub optional_frameworks: &'static [&'static str],
}

impl CakeVersion {
    /// True when `frameworks` declares the required framework and nothing
    /// outside the optional set. The match is exact by policy: a superset
    /// that drags in unrelated targets is not conformant.
    pub fn frameworks_conform(&self, frameworks: &[String]) -> bool {
        let declares_required = frameworks
            .iter()
            .any(|f| f.eq_ignore_ascii_case(self.required_framework));
        if !declares_required {
            return false;
        }

        frameworks.iter().all(|f| {
            f.eq_ignore_ascii_case(self.required_framework)
                || self
                    .optional_frameworks
                    .iter()
                    .any(|opt| f.eq_ignore_ascii_case(opt))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAKE: CakeVersion = CakeVersion {
        version: "0.33.0",
        required_framework: "netstandard2.0",
        optional_frameworks: &["net461", "net462"],
    };

    fn frameworks(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_required_framework_alone_conforms() {
        assert!(CAKE.frameworks_conform(&frameworks(&["netstandard2.0"])));
    }

    #[test]
    fn test_required_plus_optional_conforms() {
        assert!(CAKE.frameworks_conform(&frameworks(&["netstandard2.0", "net461"])));
    }

    #[test]
    fn test_missing_required_framework_fails() {
        assert!(!CAKE.frameworks_conform(&frameworks(&["net461"])));
        assert!(!CAKE.frameworks_conform(&frameworks(&[])));
    }

    #[test]
    fn test_unexpected_framework_fails() {
        assert!(!CAKE.frameworks_conform(&frameworks(&["netstandard2.0", "net35"])));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(CAKE.frameworks_conform(&frameworks(&["NetStandard2.0"])));
    }
}
