//! The navigation model shared by the NCX and the EPUB 3 navigation document.
//!
//! Points live in an arena owned by [`Navigation`] and are addressed by
//! [`NavHandle`]. A cursor stack tracks the level new points attach to.

use crate::package::{ReferenceOrder, ReferenceType};
use crate::version::TextDirection;

/// Opaque reference to a [`NavPoint`] within its [`Navigation`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NavHandle(usize);

impl NavHandle {
    pub(crate) const ROOT: NavHandle = NavHandle(0);
}

/// A node of the navigation tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavPoint {
    label: String,
    src: Option<String>,
    id: Option<String>,
    class: Option<String>,
    hidden: bool,
    direction: Option<TextDirection>,
    depth: usize,
    children: Vec<NavHandle>,
}

impl NavPoint {
    fn new(label: String, src: Option<String>, depth: usize) -> Self {
        Self {
            label,
            src,
            id: None,
            class: None,
            hidden: false,
            direction: None,
            depth,
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The target href, relative to the book root, optionally with a fragment.
    /// Grouping points have no target.
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn direction(&self) -> Option<TextDirection> {
        self.direction
    }

    /// `1` for points directly below the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[NavHandle] {
        &self.children
    }
}

/// Arguments of [`Navigation::sub_level`].
///
/// With a title, a grouping point is created and entered.
/// Without one, the last point of the current level is entered.
#[derive(Clone, Debug, Default)]
pub struct SubLevel {
    pub(crate) title: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) class: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) direction: Option<TextDirection>,
}

impl SubLevel {
    /// Create and enter a grouping point named `title`.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Enter the last point of the current level.
    pub fn last() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn direction(mut self, direction: TextDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// A registered structural landmark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Landmark {
    kind: ReferenceType,
    href: String,
    title: String,
}

impl Landmark {
    pub fn kind(&self) -> ReferenceType {
        self.kind
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// The navigation tree, its cursor, the flat chapter index and the
/// landmark registry.
#[derive(Clone, Debug)]
pub struct Navigation {
    points: Vec<NavPoint>,
    cursor: Vec<NavHandle>,
    chapters: Vec<(String, NavHandle)>,
    landmarks: Vec<Landmark>,
    references_title: String,
    references_id: Option<String>,
    references_class: Option<String>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            points: vec![NavPoint::new(String::new(), None, 0)],
            cursor: vec![NavHandle::ROOT],
            chapters: Vec::new(),
            landmarks: Vec::new(),
            references_title: "Guide".to_owned(),
            references_id: None,
            references_class: None,
        }
    }
}

impl Navigation {
    pub fn root(&self) -> &NavPoint {
        &self.points[NavHandle::ROOT.0]
    }

    pub fn point(&self, handle: NavHandle) -> &NavPoint {
        &self.points[handle.0]
    }

    pub(crate) fn point_mut(&mut self, handle: NavHandle) -> &mut NavPoint {
        &mut self.points[handle.0]
    }

    /// The children of a point, paired with their handles.
    pub fn children_of(&self, handle: NavHandle) -> impl Iterator<Item = (NavHandle, &NavPoint)> {
        self.points[handle.0]
            .children
            .iter()
            .map(|child| (*child, &self.points[child.0]))
    }

    /// Points below the root, depth-first in document order.
    pub fn walk(&self) -> Vec<(NavHandle, &NavPoint)> {
        fn visit<'a>(nav: &'a Navigation, handle: NavHandle, out: &mut Vec<(NavHandle, &'a NavPoint)>) {
            for (child, point) in nav.children_of(handle) {
                out.push((child, point));
                visit(nav, child, out);
            }
        }

        let mut out = Vec::with_capacity(self.points.len());
        visit(self, NavHandle::ROOT, &mut out);
        out
    }

    /// The deepest level of the tree; at least `1`.
    pub fn depth(&self) -> usize {
        self.points.iter().map(NavPoint::depth).max().unwrap_or(0).max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    /// The first target found at or beneath `handle`.
    pub fn first_target(&self, handle: NavHandle) -> Option<&str> {
        let point = self.point(handle);
        match point.src() {
            Some(src) => Some(src),
            None => point.children.iter().find_map(|child| self.first_target(*child)),
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Cursor
    ////////////////////////////////////////////////////////////////////////////////

    /// The current level; `1` at the root.
    pub fn current_level(&self) -> usize {
        self.cursor.len()
    }

    fn current(&self) -> NavHandle {
        self.cursor.last().copied().unwrap_or(NavHandle::ROOT)
    }

    /// Attach a point at the current level.
    pub fn add_nav_point(&mut self, label: impl Into<String>, src: Option<String>) -> NavHandle {
        let parent = self.current();
        let depth = self.cursor.len();
        let handle = NavHandle(self.points.len());

        self.points.push(NavPoint::new(label.into(), src, depth));
        self.points[parent.0].children.push(handle);
        handle
    }

    pub(crate) fn set_point_id(&mut self, handle: NavHandle, id: impl Into<String>) {
        self.point_mut(handle).id = Some(id.into());
    }

    /// Descend one level.
    ///
    /// Returns the entered point, or `None` when no title was given and
    /// the current level has no point to enter.
    pub fn sub_level(&mut self, level: SubLevel) -> Option<NavHandle> {
        let handle = match level.title {
            Some(title) => {
                let handle = self.add_nav_point(title, None);
                let point = self.point_mut(handle);
                point.id = level.id;
                point.class = level.class;
                point.hidden = level.hidden;
                point.direction = level.direction;
                handle
            }
            None => match self.point(self.current()).children.last() {
                Some(last) => *last,
                None => {
                    tracing::warn!(
                        level = self.current_level(),
                        "no navigation point to descend into"
                    );
                    return None;
                }
            },
        };
        self.cursor.push(handle);
        Some(handle)
    }

    /// Ascend one level.
    ///
    /// At the root this is a no-op that logs a warning and returns `false`.
    pub fn back_level(&mut self) -> bool {
        if self.cursor.len() <= 1 {
            tracing::warn!("navigation is already at the root level");
            return false;
        }
        self.cursor.pop();
        true
    }

    /// Return to the root level.
    pub fn root_level(&mut self) {
        self.cursor.truncate(1);
    }

    /// Move the cursor to `level` (1-based), ascending or descending into
    /// the last point of each level as needed.
    pub fn set_current_level(&mut self, level: usize) {
        let level = level.max(1);
        while self.current_level() > level {
            self.cursor.pop();
        }
        while self.current_level() < level {
            if self.sub_level(SubLevel::last()).is_none() {
                break;
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Chapter index
    ////////////////////////////////////////////////////////////////////////////////

    /// Index a chapter point by title. A repeated title replaces the earlier entry.
    pub fn register_chapter(&mut self, title: impl Into<String>, handle: NavHandle) {
        let title = title.into();
        match self.chapters.iter_mut().find(|(existing, _)| *existing == title) {
            Some((_, existing)) => *existing = handle,
            None => self.chapters.push((title, handle)),
        }
    }

    pub fn chapter(&self, title: &str) -> Option<NavHandle> {
        self.chapters
            .iter()
            .find(|(existing, _)| existing == title)
            .map(|(_, handle)| *handle)
    }

    /// Indexed chapters, in insertion order.
    pub fn chapters(&self) -> impl Iterator<Item = (&str, &NavPoint)> {
        self.chapters
            .iter()
            .map(|(title, handle)| (title.as_str(), self.point(*handle)))
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Landmarks
    ////////////////////////////////////////////////////////////////////////////////

    /// Register a landmark. A second table of contents is ignored.
    pub fn add_landmark(
        &mut self,
        kind: ReferenceType,
        href: impl Into<String>,
        title: impl Into<String>,
    ) -> bool {
        if kind == ReferenceType::Toc && self.landmark(kind).is_some() {
            return false;
        }
        self.landmarks.push(Landmark {
            kind,
            href: href.into(),
            title: title.into(),
        });
        true
    }

    pub fn landmark(&self, kind: ReferenceType) -> Option<&Landmark> {
        self.landmarks.iter().find(|landmark| landmark.kind == kind)
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Landmarks sorted by `order`; types absent from `order` follow in
    /// registration order.
    pub fn ordered_landmarks<'a>(&'a self, order: &ReferenceOrder) -> Vec<&'a Landmark> {
        let mut ordered: Vec<&Landmark> = order
            .iter()
            .filter_map(|(kind, _)| self.landmark(kind))
            .collect();
        for landmark in &self.landmarks {
            if !ordered.iter().any(|existing| existing.kind == landmark.kind) {
                ordered.push(landmark);
            }
        }
        ordered
    }

    pub fn set_references_title(&mut self, title: impl Into<String>, id: Option<String>, class: Option<String>) {
        self.references_title = title.into();
        self.references_id = id;
        self.references_class = class;
    }

    pub fn references_title(&self) -> &str {
        &self.references_title
    }

    /// Group the registered landmarks (except the main text) under a new
    /// top-level point titled with the references title.
    pub fn finalize_references(&mut self, order: &ReferenceOrder) {
        let entries: Vec<(String, String)> = self
            .ordered_landmarks(order)
            .into_iter()
            .filter(|landmark| landmark.kind != ReferenceType::Text)
            .map(|landmark| {
                let title = if landmark.title.is_empty() {
                    order.title(landmark.kind).unwrap_or_default().to_owned()
                } else {
                    landmark.title.clone()
                };
                (title, landmark.href.clone())
            })
            .collect();

        if entries.is_empty() {
            return;
        }

        self.root_level();
        let mut level = SubLevel::titled(self.references_title.clone());
        level.id = self.references_id.clone();
        level.class = self.references_class.clone();
        self.sub_level(level);

        for (title, href) in entries {
            self.add_nav_point(title, Some(href));
        }
        self.root_level();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(nav: &Navigation) -> Vec<(usize, &str)> {
        nav.walk()
            .into_iter()
            .map(|(_, point)| (point.depth(), point.label()))
            .collect()
    }

    #[test]
    fn test_cursor() {
        let mut nav = Navigation::default();
        nav.add_nav_point("Prologue", Some("prologue.xhtml".into()));
        nav.sub_level(SubLevel::titled("Part I"));
        nav.add_nav_point("Chapter 1", Some("c1.xhtml".into()));
        nav.sub_level(SubLevel::last());
        nav.add_nav_point("Section 1.1", Some("c1.xhtml#s1".into()));
        assert_eq!(3, nav.current_level());
        assert!(nav.back_level());
        nav.add_nav_point("Chapter 2", Some("c2.xhtml".into()));
        nav.root_level();
        nav.add_nav_point("Epilogue", Some("epilogue.xhtml".into()));

        #[rustfmt::skip]
        let expected = vec![
            (1, "Prologue"),
            (1, "Part I"),
            (2, "Chapter 1"),
            (3, "Section 1.1"),
            (2, "Chapter 2"),
            (1, "Epilogue"),
        ];
        assert_eq!(expected, labels(&nav));
        assert_eq!(3, nav.depth());
    }

    #[test]
    fn test_back_level_at_root_is_noop() {
        let mut nav = Navigation::default();
        assert!(!nav.back_level());
        assert_eq!(1, nav.current_level());
        assert_eq!(None, nav.sub_level(SubLevel::last()));
        assert_eq!(1, nav.current_level());
        assert_eq!(1, nav.depth());
    }

    #[test]
    fn test_set_current_level() {
        let mut nav = Navigation::default();
        nav.add_nav_point("A", Some("a.xhtml".into()));
        nav.set_current_level(2);
        nav.add_nav_point("A.1", Some("a.xhtml#1".into()));
        nav.set_current_level(5);
        assert_eq!(3, nav.current_level());
        nav.set_current_level(0);
        assert_eq!(1, nav.current_level());
    }

    #[test]
    fn test_first_target() {
        let mut nav = Navigation::default();
        let part = nav.sub_level(SubLevel::titled("Part")).unwrap();
        nav.sub_level(SubLevel::titled("Group"));
        nav.add_nav_point("Deep", Some("deep.xhtml".into()));

        assert_eq!(Some("deep.xhtml"), nav.first_target(part));
        assert_eq!(None, nav.point(part).src());
    }

    #[test]
    fn test_chapter_index() {
        let mut nav = Navigation::default();
        let first = nav.add_nav_point("Intro", Some("a.xhtml".into()));
        let second = nav.add_nav_point("Intro", Some("b.xhtml".into()));
        nav.register_chapter("Intro", first);
        nav.register_chapter("Intro", second);

        assert_eq!(Some(second), nav.chapter("Intro"));
        assert_eq!(1, nav.chapters().count());
    }

    #[test]
    fn test_finalize_references() {
        let mut nav = Navigation::default();
        nav.add_nav_point("Chapter 1", Some("c1.xhtml".into()));
        nav.add_landmark(ReferenceType::Text, "c1.xhtml", "Begin");
        nav.add_landmark(ReferenceType::Toc, "TOC.xhtml", "");
        nav.add_landmark(ReferenceType::Cover, "CoverPage.xhtml", "Cover");
        assert!(!nav.add_landmark(ReferenceType::Toc, "TOC2.xhtml", "Again"));
        nav.set_references_title("References", None, None);

        nav.finalize_references(&ReferenceOrder::default());

        #[rustfmt::skip]
        let expected = vec![
            (1, "Chapter 1"),
            (1, "References"),
            (2, "Cover"),
            (2, "Table of Contents"),
        ];
        assert_eq!(expected, labels(&nav));
        assert_eq!(1, nav.current_level());
    }
}
