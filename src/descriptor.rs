//! Static extraction of metadata from MSBuild project descriptors.
//!
//! Two schema generations are supported concurrently: the SDK-style
//! attribute-based `<PackageReference>` element and the legacy namespaced
//! `<Reference Include="Id, Version=.., ..">` form. Tag names are matched
//! by local name so the MSBuild namespace on legacy documents is irrelevant.
//!
//! Malformed or empty documents yield empty results, never an error: a
//! descriptor we could fetch but not parse degrades the record's metadata,
//! it does not fail the stage.

use crate::models::PackageReference;
use crate::util::extract_between;
use roxmltree::{Document, Node};
use tracing::debug;

/// Extracts every declared package reference, across both schema
/// generations, in document order.
pub fn parse_references(content: &str) -> Vec<PackageReference> {
    let doc = match Document::parse(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "descriptor is not well-formed XML, no references extracted");
            return Vec::new();
        }
    };

    let mut references = Vec::new();

    for node in doc.descendants() {
        match node.tag_name().name() {
            "PackageReference" => {
                if let Some(reference) = parse_package_reference(&node) {
                    references.push(reference);
                }
            }
            "Reference" => {
                if let Some(reference) = parse_legacy_reference(&node) {
                    references.push(reference);
                }
            }
            _ => {}
        }
    }

    references
}

fn parse_package_reference(node: &Node) -> Option<PackageReference> {
    let id = node.attribute("Include")?.to_string();
    let version = node.attribute("Version").map(str::to_string);

    // Privacy can be declared as an attribute or a child element; either
    // way it only counts when all assets are excluded.
    let mut is_private = node
        .attribute("PrivateAssets")
        .is_some_and(|v| v.eq_ignore_ascii_case("all"));
    if let Some(child) = child_element(node, "PrivateAssets") {
        is_private = child.text().is_some_and(|v| v.trim().eq_ignore_ascii_case("all"));
    }

    Some(PackageReference {
        id,
        version,
        is_private,
    })
}

fn parse_legacy_reference(node: &Node) -> Option<PackageReference> {
    let include = node.attribute("Include")?;

    let is_private = child_element(node, "Private")
        .and_then(|c| c.text())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

    // The include attribute packs id and version into a comma-separated
    // assembly identity: "Cake.Core, Version=0.22.0.0, Culture=neutral".
    match include.find(',') {
        Some(comma) => Some(PackageReference {
            id: include[..comma].trim().to_string(),
            version: extract_between("Version=", ",", include).map(str::to_string),
            is_private,
        }),
        None => Some(PackageReference {
            id: include.trim().to_string(),
            version: None,
            is_private,
        }),
    }
}

/// Extracts every declared target framework, deduplicated in document order.
pub fn parse_target_frameworks(content: &str) -> Vec<String> {
    let doc = match Document::parse(content) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "descriptor is not well-formed XML, no frameworks extracted");
            return Vec::new();
        }
    };

    let mut frameworks: Vec<String> = Vec::new();
    let mut push = |framework: &str| {
        let framework = framework.trim();
        if !framework.is_empty() && !frameworks.iter().any(|f| f == framework) {
            frameworks.push(framework.to_string());
        }
    };

    for node in doc.descendants() {
        match node.tag_name().name() {
            "TargetFramework" | "TargetFrameworkVersion" => {
                if let Some(text) = node.text() {
                    push(text);
                }
            }
            "TargetFrameworks" => {
                if let Some(text) = node.text() {
                    for framework in text.split(';') {
                        push(framework);
                    }
                }
            }
            _ => {}
        }
    }

    frameworks
}

/// Extracts the packaging icon URL, if declared. Both the project-file
/// property (`PackageIconUrl`) and the package-manifest element
/// (`iconUrl`) are recognized.
pub fn parse_icon_url(content: &str) -> Option<String> {
    let doc = Document::parse(content).ok()?;

    doc.descendants()
        .find(|n| matches!(n.tag_name().name(), "PackageIconUrl" | "iconUrl"))
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn child_element<'a>(node: &Node<'a, 'a>, name: &str) -> Option<Node<'a, 'a>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}
