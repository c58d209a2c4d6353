//! Tidal point selection and response aggregation.
//!
//! When a measurement lies exactly between two points of the API's 10 minute
//! grid, the ±5 minute window returns both. The later point is used; no
//! interpolation is done. A linear interpolation between the two would be
//! the natural refinement if the precision requirements tighten.

use xmltree::{Element, XMLNode};

use crate::ingest::tide::elements_named;
use crate::model::{RowFailure, TidalPoint};

/// The point whose value is recorded for a row: the last one in response
/// order.
pub fn select_point(points: &[TidalPoint]) -> Option<&TidalPoint> {
    points.last()
}

/// Reduce a row's tidal points to the raw value that feeds chart datum.
pub fn select_value(points: &[TidalPoint]) -> Result<String, RowFailure> {
    let point = select_point(points).ok_or(RowFailure::NoWaterLevel)?;
    point.value.clone().ok_or(RowFailure::MissingValue)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Combined document of all raw responses, built in row order.
///
/// The first `<tide>` element ever seen makes its whole response the
/// aggregate root. Every later `<tide>` element contributes its children,
/// appended under that root.
#[derive(Debug, Clone, Default)]
pub struct ResponseAggregate {
    root: Option<Element>,
}

impl ResponseAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one response document into the aggregate.
    pub fn absorb(mut self, response: &Element) -> Self {
        for tide in elements_named(response, "tide") {
            match self.root.as_mut() {
                None => self.root = Some(response.clone()),
                Some(root) => root.children.extend(
                    tide.children
                        .iter()
                        .filter(|node| matches!(node, XMLNode::Element(_)))
                        .cloned(),
                ),
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn finish(self) -> Option<Element> {
        self.root
    }
}

/// Fold all response fragments, in the given order, into one document.
pub fn aggregate_fragments<'a, I>(fragments: I) -> Option<Element>
where
    I: IntoIterator<Item = &'a Element>,
{
    fragments
        .into_iter()
        .fold(ResponseAggregate::new(), ResponseAggregate::absorb)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(value: &str) -> TidalPoint {
        TidalPoint {
            time: None,
            value: Some(value.to_string()),
            flag: Some("pre".to_string()),
        }
    }

    fn response(location: &str, value: &str) -> Element {
        let body = format!(
            r#"<tide><locationdata><location name="{}"/><data><waterlevel value="{}"/></data></locationdata></tide>"#,
            location, value
        );
        Element::parse(body.as_bytes()).unwrap()
    }

    fn location_names(root: &Element) -> Vec<String> {
        elements_named(root, "location")
            .into_iter()
            .filter_map(|el| el.attributes.get("name").cloned())
            .collect()
    }

    #[test]
    fn test_single_point_is_selected() {
        assert_eq!(select_value(&[point("150")]), Ok("150".to_string()));
    }

    #[test]
    fn test_later_of_two_points_wins() {
        let points = [point("148"), point("152")];
        assert_eq!(select_point(&points).and_then(|p| p.value.as_deref()), Some("152"));
        assert_eq!(select_value(&points), Ok("152".to_string()));
    }

    #[test]
    fn test_no_points_is_no_water_level() {
        assert_eq!(select_value(&[]), Err(RowFailure::NoWaterLevel));
    }

    #[test]
    fn test_selected_point_without_value() {
        let points = [point("148"), TidalPoint::default()];
        assert_eq!(select_value(&points), Err(RowFailure::MissingValue));
    }

    #[test]
    fn test_aggregate_appends_in_row_order() {
        let fragments = vec![response("A", "1"), response("B", "2"), response("C", "3")];
        let aggregate = aggregate_fragments(fragments.iter()).expect("aggregate exists");

        assert_eq!(aggregate.name, "tide");
        assert_eq!(elements_named(&aggregate, "locationdata").len(), 3);
        assert_eq!(location_names(&aggregate), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_aggregate_of_nothing_is_none() {
        assert!(aggregate_fragments(std::iter::empty()).is_none());

        let error_doc = Element::parse(r#"<error>bad request</error>"#.as_bytes()).unwrap();
        assert!(aggregate_fragments([&error_doc]).is_none());
    }

    #[test]
    fn test_responses_without_tide_do_not_contribute() {
        let error_doc = Element::parse(r#"<error><location name="X"/></error>"#.as_bytes()).unwrap();
        let fragments = vec![error_doc, response("A", "1"), response("B", "2")];
        let aggregate = aggregate_fragments(fragments.iter()).unwrap();
        assert_eq!(location_names(&aggregate), vec!["A", "B"]);
    }

    #[test]
    fn test_absorb_does_not_mutate_fragments() {
        let first = response("A", "1");
        let second = response("B", "2");
        let aggregate = ResponseAggregate::new().absorb(&first).absorb(&second);
        assert!(!aggregate.is_empty());
        assert_eq!(location_names(&first), vec!["A"]);
    }
}
