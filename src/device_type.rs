//! The fixed device-family table shared by the query grammar (which needs the
//! keywords) and the resolver (which needs the classifier pairs).

use crate::topology::DeviceClassifier;

/// One device family: a query keyword plus the classifier values it covers.
/// A node belongs to the family when its class id matches exactly and its
/// category id is one of the listed categories.
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceFamily {
    pub keyword: &'static str,
    pub class_id: &'static str,
    pub category_ids: &'static [&'static str],
}

/// Longer keywords come first so that anchored prefix matching can never let
/// `windows` shadow `windows.server`.
pub const DEVICE_FAMILIES: &[DeviceFamily] = &[
    DeviceFamily {
        keyword: "windows.workstation",
        class_id: "1",
        category_ids: &["1"],
    },
    DeviceFamily {
        keyword: "windows.server",
        class_id: "1",
        category_ids: &["2", "3"],
    },
    DeviceFamily {
        keyword: "windows",
        class_id: "1",
        category_ids: &["1", "2", "3"],
    },
    DeviceFamily {
        keyword: "linux",
        class_id: "1",
        category_ids: &["4"],
    },
    DeviceFamily {
        keyword: "unix",
        class_id: "1",
        category_ids: &["5"],
    },
    DeviceFamily {
        keyword: "esx",
        class_id: "2",
        category_ids: &["1"],
    },
    DeviceFamily {
        keyword: "vcenter",
        class_id: "2",
        category_ids: &["2"],
    },
];

pub fn family_for_keyword(keyword: &str) -> Option<&'static DeviceFamily> {
    DEVICE_FAMILIES
        .iter()
        .find(|family| family.keyword.eq_ignore_ascii_case(keyword))
}

/// True iff the classifier falls inside the family named by `keyword`.
/// Unknown keywords and empty classifiers never match.
pub fn classifier_matches(keyword: &str, classifier: &DeviceClassifier) -> bool {
    let Some(family) = family_for_keyword(keyword) else {
        return false;
    };
    classifier.class_id == family.class_id
        && family
            .category_ids
            .contains(&classifier.category_id.as_str())
}
