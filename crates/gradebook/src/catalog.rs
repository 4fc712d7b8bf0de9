//! Subject catalog: which subjects each class and group studies.

use crate::model::{ClassLevel, Group};

/// Subjects shared by every student in classes 6 to 8.
const JUNIOR_SUBJECTS: [&str; 12] = [
    "Bangla 1st Paper",
    "Bangla 2nd Paper",
    "English 1st Paper",
    "English 2nd Paper",
    "Mathematics",
    "Science & Technology",
    "Bangladesh & Global Studies",
    "Digital Technology (ICT)",
    "Religion & Moral Education",
    "Health & Physical Ed.",
    "Agriculture",
    "Arts & Culture / Work & Arts",
];

/// Subjects shared by every group in classes 9 and 10.
const SECONDARY_COMMON: [&str; 7] = [
    "Bangla 1st Paper",
    "Bangla 2nd Paper",
    "English 1st Paper",
    "English 2nd Paper",
    "Mathematics",
    "Digital Technology (ICT)",
    "Religion & Moral Education",
];

const SCIENCE_SUBJECTS: [&str; 5] = [
    "Physics",
    "Chemistry",
    "Biology",
    "Bangladesh & Global Science",
    "Higher Math / Agriculture",
];

const BUSINESS_SUBJECTS: [&str; 3] = ["Accounting", "Finance", "Business Entrepreneurship"];

const HUMANITIES_SUBJECTS: [&str; 4] = ["History", "Geography", "Civics", "Science"];

impl Group {
    /// Subjects this group adds to the secondary common list.
    #[must_use]
    pub fn elective_subjects(self) -> &'static [&'static str] {
        match self {
            Self::Science => &SCIENCE_SUBJECTS,
            Self::BusinessStudies => &BUSINESS_SUBJECTS,
            Self::Humanities => &HUMANITIES_SUBJECTS,
        }
    }
}

impl ClassLevel {
    /// Ordered subject list for this class.
    ///
    /// The group is ignored for classes 6 to 8. For classes 9 and 10 without
    /// a group only the common subjects are returned.
    #[must_use]
    pub fn subjects(self, group: Option<Group>) -> Vec<&'static str> {
        if self.requires_group() {
            let mut subjects = SECONDARY_COMMON.to_vec();
            if let Some(group) = group {
                subjects.extend_from_slice(group.elective_subjects());
            }
            subjects
        } else {
            JUNIOR_SUBJECTS.to_vec()
        }
    }

    /// Groups a student of this class can choose from.
    #[must_use]
    pub fn groups(self) -> &'static [Group] {
        if self.requires_group() {
            &Group::ALL
        } else {
            &[]
        }
    }
}

/// Subjects for a raw class number; empty for classes the school does not teach.
#[must_use]
pub fn subjects_for(class_number: u8, group: Option<Group>) -> Vec<&'static str> {
    ClassLevel::try_from(class_number)
        .map(|class| class.subjects(group))
        .unwrap_or_default()
}

/// Like [`subjects_for`], but with the group given by name.
///
/// An unrecognised group name is treated as no group.
#[must_use]
pub fn subjects_for_group_name(class_number: u8, group: Option<&str>) -> Vec<&'static str> {
    subjects_for(class_number, group.and_then(|g| g.parse().ok()))
}

/// Groups offered to a raw class number.
#[must_use]
pub fn groups_for(class_number: u8) -> &'static [Group] {
    match ClassLevel::try_from(class_number) {
        Ok(class) => class.groups(),
        Err(_) => &[],
    }
}

/// Whether `subject` is taught to `class` in `group`.
#[must_use]
pub fn contains(class: ClassLevel, group: Option<Group>, subject: &str) -> bool {
    class.subjects(group).contains(&subject)
}
