use crate::StampError;
use std::collections::BTreeMap;

/// Insertion point in PDF user-space units, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Caller-supplied replacements for default insertion points, keyed by page index.
pub type CoordinateOverrides = BTreeMap<usize, Point>;

/// Which pages of a template receive the stamped name, and where by default.
///
/// `page_set` is a strictly increasing subsequence of the template document's
/// physical pages. Every member has a default point; `defaults` has no other keys.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDefinition {
    pub id: String,
    pub page_set: Vec<usize>,
    pub defaults: BTreeMap<usize, Point>,
}

impl TemplateDefinition {
    pub fn new(
        id: impl Into<String>,
        placements: &[(usize, Point)],
    ) -> Result<Self, StampError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(StampError::InvalidTemplateDefinition(
                "template id cannot be empty".to_string(),
            ));
        }
        if placements.is_empty() {
            return Err(StampError::InvalidTemplateDefinition(format!(
                "template {} has an empty page set",
                id
            )));
        }
        let mut page_set = Vec::with_capacity(placements.len());
        let mut defaults = BTreeMap::new();
        for (page, point) in placements {
            if let Some(last) = page_set.last() {
                if page <= last {
                    return Err(StampError::InvalidTemplateDefinition(format!(
                        "template {} page set must be strictly increasing (page {} after {})",
                        id, page, last
                    )));
                }
            }
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(StampError::InvalidTemplateDefinition(format!(
                    "template {} page {} default point is not finite",
                    id, page
                )));
            }
            page_set.push(*page);
            defaults.insert(*page, *point);
        }
        Ok(Self {
            id,
            page_set,
            defaults,
        })
    }

    pub fn includes_page(&self, page: usize) -> bool {
        self.page_set.binary_search(&page).is_ok()
    }

    /// Merge caller overrides with the template defaults, in page-set order.
    ///
    /// Overrides for pages outside the page set are ignored; overrides cannot
    /// add pages beyond what the template defines. The returned order is the
    /// draw order and is stable for a given template.
    pub fn resolve_coordinates(
        &self,
        overrides: Option<&CoordinateOverrides>,
    ) -> Vec<(usize, Point)> {
        self.page_set
            .iter()
            .map(|page| {
                let point = overrides
                    .and_then(|o| o.get(page))
                    .or_else(|| self.defaults.get(page))
                    .copied()
                    .unwrap_or(Point { x: 0.0, y: 0.0 });
                (*page, point)
            })
            .collect()
    }
}

/// Static table of template variants, the single source of truth for which
/// pages a template touches and where names go by default.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    by_id: BTreeMap<String, TemplateDefinition>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The production invitation templates. Variants sharing a layout share a
    /// row; a page absent from the set is never drawn on for that variant.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let rows: &[(&[&str], &[(usize, Point)])] = &[
            (
                &["A", "B", "C"],
                &[
                    (0, Point::new(100.0, 375.0)),
                    (3, Point::new(205.0, 550.0)),
                    (4, Point::new(175.0, 550.0)),
                ],
            ),
            (
                &["D", "E", "J"],
                &[(0, Point::new(100.0, 375.0)), (3, Point::new(205.0, 550.0))],
            ),
            (
                &["F", "G"],
                &[(0, Point::new(100.0, 375.0)), (3, Point::new(175.0, 550.0))],
            ),
            (&["H", "I"], &[(0, Point::new(100.0, 375.0))]),
        ];
        for (ids, placements) in rows {
            for id in *ids {
                let mut page_set = Vec::with_capacity(placements.len());
                let mut defaults = BTreeMap::new();
                for (page, point) in *placements {
                    page_set.push(*page);
                    defaults.insert(*page, *point);
                }
                registry.by_id.insert(
                    (*id).to_string(),
                    TemplateDefinition {
                        id: (*id).to_string(),
                        page_set,
                        defaults,
                    },
                );
            }
        }
        registry
    }

    pub fn register(&mut self, def: TemplateDefinition) -> Result<(), StampError> {
        if self.by_id.contains_key(&def.id) {
            return Err(StampError::InvalidTemplateDefinition(format!(
                "duplicate template id: {}",
                def.id
            )));
        }
        self.by_id.insert(def.id.clone(), def);
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Result<&TemplateDefinition, StampError> {
        self.by_id
            .get(id)
            .ok_or_else(|| StampError::UnknownTemplate(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
