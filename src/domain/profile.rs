//! Profile completion and role-dependent field visibility.

use super::Role;

/// Fields every profile can fill in.
pub const BASE_FIELDS: &[&str] = &["first_name", "last_name", "bio", "phone_number"];

pub const STUDENT_FIELDS: &[&str] = &["school_organization", "grade_level"];

pub const JUDGE_FIELDS: &[&str] = &["expertise_area", "years_experience"];

/// Editable fields shared by every role, in form order.
const COMMON_EDITABLE: &[&str] = &[
    "first_name",
    "last_name",
    "bio",
    "profile_image",
    "phone_number",
    "date_of_birth",
];

/// Completion threshold at which the dashboard treats a profile as complete.
pub const COMPLETE_THRESHOLD: u8 = 80;

/// The subset of profile data the completion calculator looks at.
#[derive(Debug, Clone, Default)]
pub struct CompletionInput<'a> {
    pub role: Role,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub bio: &'a str,
    pub phone_number: &'a str,
    pub school_organization: &'a str,
    pub grade_level: &'a str,
    pub expertise_area: &'a str,
    pub years_experience: Option<i32>,
    pub has_image: bool,
}

/// Percentage of the role's fields that are populated, rounded down.
///
/// The image only counts when present: it then adds one to both the
/// numerator and the denominator.
#[must_use]
pub fn completion(input: &CompletionInput<'_>) -> u8 {
    let mut fields: Vec<bool> = vec![
        !input.first_name.is_empty(),
        !input.last_name.is_empty(),
        !input.bio.is_empty(),
        !input.phone_number.is_empty(),
    ];

    match input.role {
        Role::Student => {
            fields.push(!input.school_organization.is_empty());
            fields.push(!input.grade_level.is_empty());
        }
        Role::Judge => {
            fields.push(!input.expertise_area.is_empty());
            fields.push(input.years_experience.is_some_and(|y| y > 0));
        }
        Role::Admin => {}
    }

    if input.has_image {
        fields.push(true);
    }

    let populated = fields.iter().filter(|f| **f).count();
    let total = fields.len();

    // total is at least the four base fields
    u8::try_from(populated * 100 / total).unwrap_or(100)
}

/// Profile form fields a role may see and edit.
#[must_use]
pub fn visible_fields(role: Role) -> Vec<&'static str> {
    let mut fields = COMMON_EDITABLE.to_vec();
    match role {
        Role::Student => fields.extend_from_slice(STUDENT_FIELDS),
        Role::Judge => fields.extend_from_slice(JUDGE_FIELDS),
        Role::Admin => {}
    }
    fields
}

/// "First Last", trimmed. Empty when neither name is set.
#[must_use]
pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}").trim().to_string()
}

/// Best available label for an account: full name, then username, then email.
#[must_use]
pub fn display_name(first_name: &str, last_name: &str, username: &str, email: &str) -> String {
    let full = full_name(first_name, last_name);
    if !full.is_empty() {
        full
    } else if !username.is_empty() {
        username.to_string()
    } else {
        email.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student<'a>() -> CompletionInput<'a> {
        CompletionInput {
            role: Role::Student,
            ..Default::default()
        }
    }

    #[test]
    fn student_with_only_first_name() {
        let input = CompletionInput {
            first_name: "Ada",
            ..student()
        };
        // 1 of 6 fields
        assert_eq!(completion(&input), 16);
    }

    #[test]
    fn empty_profiles_are_zero() {
        assert_eq!(completion(&student()), 0);
        let admin = CompletionInput {
            role: Role::Admin,
            ..Default::default()
        };
        assert_eq!(completion(&admin), 0);
    }

    #[test]
    fn image_grows_numerator_and_denominator() {
        let without = CompletionInput {
            first_name: "Ada",
            ..student()
        };
        let with = CompletionInput {
            has_image: true,
            ..without.clone()
        };
        // 1/6 vs 2/7
        assert_eq!(completion(&without), 16);
        assert_eq!(completion(&with), 28);
    }

    #[test]
    fn judge_years_must_be_positive() {
        let mut input = CompletionInput {
            role: Role::Judge,
            first_name: "J",
            last_name: "D",
            bio: "Film critic",
            phone_number: "555",
            expertise_area: "Cinematography",
            years_experience: Some(0),
            ..Default::default()
        };
        assert_eq!(completion(&input), 83);

        input.years_experience = Some(12);
        assert_eq!(completion(&input), 100);
    }

    #[test]
    fn admin_uses_base_fields_only() {
        let input = CompletionInput {
            role: Role::Admin,
            first_name: "A",
            last_name: "B",
            school_organization: "ignored",
            ..Default::default()
        };
        assert_eq!(completion(&input), 50);
    }

    #[test]
    fn completion_is_monotonic_as_fields_fill_in() {
        for has_image in [false, true] {
            let steps = [
                CompletionInput {
                    has_image,
                    ..student()
                },
                CompletionInput {
                    first_name: "a",
                    has_image,
                    ..student()
                },
                CompletionInput {
                    first_name: "a",
                    last_name: "b",
                    has_image,
                    ..student()
                },
                CompletionInput {
                    first_name: "a",
                    last_name: "b",
                    bio: "c",
                    phone_number: "d",
                    has_image,
                    ..student()
                },
                CompletionInput {
                    first_name: "a",
                    last_name: "b",
                    bio: "c",
                    phone_number: "d",
                    school_organization: "e",
                    grade_level: "f",
                    has_image,
                    ..student()
                },
            ];
            let values: Vec<u8> = steps.iter().map(completion).collect();
            assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
            assert_eq!(values.last(), Some(&100));
        }
    }

    #[test]
    fn visible_fields_follow_role() {
        let student = visible_fields(Role::Student);
        assert!(student.contains(&"grade_level"));
        assert!(!student.contains(&"expertise_area"));

        let judge = visible_fields(Role::Judge);
        assert!(judge.contains(&"years_experience"));
        assert!(!judge.contains(&"school_organization"));

        let admin = visible_fields(Role::Admin);
        assert_eq!(admin.len(), COMMON_EDITABLE.len());
    }

    #[test]
    fn display_name_fallbacks() {
        assert_eq!(display_name("Ada", "", "ada99", "a@x.com"), "Ada");
        assert_eq!(display_name("", "", "ada99", "a@x.com"), "ada99");
        assert_eq!(display_name("", "", "", "a@x.com"), "a@x.com");
        assert_eq!(full_name(" ", "Lovelace"), "Lovelace");
    }
}
