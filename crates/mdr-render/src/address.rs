//! Re-derive element addresses from rendered markup.

use crate::svg::{ATTR_ENTITY, ATTR_INDEX, ATTR_LABEL_INDEX};
use mdr_core::{ElementRef, EntityKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("markup is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("bad {attr} value `{value}`")]
    BadAddress { attr: &'static str, value: String },

    #[error("element with data-entity has no data-index")]
    MissingIndex,
}

/// One addressable element found in markup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedElement {
    pub address: ElementRef,
    /// Tag of the drawn element (the child of the `<g>` wrapper for shapes).
    pub tag: String,
}

fn parse_index(attr: &'static str, value: &str) -> Result<usize, MarkupError> {
    value.trim().parse().map_err(|_| MarkupError::BadAddress {
        attr,
        value: value.to_string(),
    })
}

/// Collect every addressable element in document order.
///
/// # Errors
/// Fails on malformed XML or on address attributes that do not parse.
pub fn scan_markup(svg: &str) -> Result<Vec<ScannedElement>, MarkupError> {
    let doc = roxmltree::Document::parse(svg)?;
    let mut found = Vec::new();

    for node in doc.descendants().filter(|n| n.is_element()) {
        if let Some(v) = node.attribute(ATTR_LABEL_INDEX) {
            found.push(ScannedElement {
                address: ElementRef::new(EntityKind::Label, parse_index(ATTR_LABEL_INDEX, v)?),
                tag: node.tag_name().name().to_string(),
            });
            continue;
        }
        let Some(kind) = node.attribute(ATTR_ENTITY) else {
            continue;
        };
        let kind: EntityKind = kind.parse().map_err(|_| MarkupError::BadAddress {
            attr: ATTR_ENTITY,
            value: kind.to_string(),
        })?;
        let index = node.attribute(ATTR_INDEX).ok_or(MarkupError::MissingIndex)?;
        let tag = node
            .children()
            .find(|c| c.is_element())
            .map(|c| c.tag_name().name().to_string())
            .unwrap_or_default();
        found.push(ScannedElement {
            address: ElementRef::new(kind, parse_index(ATTR_INDEX, index)?),
            tag,
        });
    }

    log::debug!("scanned {} addressable elements", found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_markup() {
        assert!(matches!(scan_markup("<svg><g>"), Err(MarkupError::Xml(_))));
    }

    #[test]
    fn rejects_unknown_entity_kinds() {
        let svg = r#"<svg><g data-entity="star" data-index="0"><path/></g></svg>"#;
        assert!(matches!(
            scan_markup(svg),
            Err(MarkupError::BadAddress { attr: "data-entity", .. })
        ));
    }

    #[test]
    fn reads_wrapped_tag() {
        let svg = r#"<svg><g data-entity="point" data-index="3"><circle cx="1" cy="2" r="4"/></g><text data-label-index="0">A</text></svg>"#;
        let found = scan_markup(svg).unwrap();
        assert_eq!(found[0].address, ElementRef::new(EntityKind::Point, 3));
        assert_eq!(found[0].tag, "circle");
        assert_eq!(found[1].address, ElementRef::new(EntityKind::Label, 0));
        assert_eq!(found[1].tag, "text");
    }
}
