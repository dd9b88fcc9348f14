use std::fmt::Debug;

use crate::ax::attribute::{self, AttrValue, ProcessId};

// ============================================================================
// AttributeProbe trait: read/write access to a foreign accessibility tree
// ============================================================================

/// Low-level access to UI element attributes owned by other processes.
///
/// Every call is a single synchronous round trip to the platform. Nothing
/// retries and nothing panics: absence or failure is reported as `None`
/// or `false`. `Element` is an opaque, non-owning token that is only valid
/// for the call chain that produced it; callers re-resolve elements on
/// every operation instead of holding on to them.
pub trait AttributeProbe {
    type Element: Clone + PartialEq + Debug;

    /// Accessibility root of the application running as `pid`.
    fn application(&self, pid: ProcessId) -> Option<Self::Element>;

    fn copy_attribute(&self, element: &Self::Element, key: &str) -> Option<AttrValue<Self::Element>>;

    fn is_settable(&self, element: &Self::Element, key: &str) -> bool;

    /// Returns whether the platform accepted the write. Acceptance does not
    /// mean the value changed; callers verify by reading back.
    fn write_bool(&self, element: &Self::Element, key: &str, value: bool) -> bool;

    /// Process owning `element`, or 0 when it cannot be determined.
    fn owning_process(&self, element: &Self::Element) -> ProcessId;

    fn read_string(&self, element: &Self::Element, key: &str) -> Option<String> {
        match self.copy_attribute(element, key)? {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn read_bool(&self, element: &Self::Element, key: &str) -> Option<bool> {
        self.copy_attribute(element, key)?.as_bool()
    }

    fn read_element(&self, element: &Self::Element, key: &str) -> Option<Self::Element> {
        self.copy_attribute(element, key)?.into_element()
    }

    fn children(&self, element: &Self::Element) -> Option<Vec<Self::Element>> {
        self.copy_attribute(element, attribute::CHILDREN)?.into_elements()
    }

    fn parent(&self, element: &Self::Element) -> Option<Self::Element> {
        self.read_element(element, attribute::PARENT)
    }
}
