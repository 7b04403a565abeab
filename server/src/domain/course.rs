//! Course Enumeration
//!
//! Courses are stored as a 1-based index into this list.

pub const COURSES: [&str; 6] = ["Entree", "Appetizer", "Side", "Soup", "Salad", "Dessert"];

/// Name of a 1-based course index
pub fn course_title(course: i64) -> Option<&'static str> {
    if course < 1 {
        return None;
    }
    COURSES.get(course as usize - 1).copied()
}

pub fn is_valid_course(course: i64) -> bool {
    course_title(course).is_some()
}

pub fn course_names() -> Vec<String> {
    COURSES.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_range() {
        assert_eq!(course_title(1), Some("Entree"));
        assert_eq!(course_title(6), Some("Dessert"));
        assert!(!is_valid_course(0));
        assert!(!is_valid_course(7));
        assert!(!is_valid_course(-1));
    }
}
