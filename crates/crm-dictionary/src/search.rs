//! Federation-scoped free-text user search.

use crm_core::User;

/// Score of one lower-cased token against a user's searchable fields.
///
/// Three cumulative passes over the fields: an exact (case-insensitive)
/// match adds 5; a prefix match adds 3, plus the number of extra
/// characters when the field is at most 5 characters longer than the
/// token; a substring match adds 1.
pub fn contain(token: &str, fields: &[&str]) -> i64 {
    let lowered: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
    let mut score = 0;

    for field in &lowered {
        if field == token {
            score += 5;
        }
    }

    for (raw, field) in fields.iter().zip(&lowered) {
        if field.starts_with(token) {
            score += 3;
            let extra = raw.len() as i64 - token.len() as i64;
            if extra <= 5 {
                score += extra;
            }
        }
    }

    for field in &lowered {
        if field.contains(token) {
            score += 1;
        }
    }

    score
}

/// Total score of `user` for `tokens`, or `None` if any token misses.
///
/// Every token scoring at least one point also puts the total at or above
/// the token count.
pub fn score(user: &User, tokens: &[&str]) -> Option<i64> {
    let phone = user.phone.to_string();
    let fields = [
        user.name.as_str(),
        user.lname.as_str(),
        user.pname.as_str(),
        user.email.as_str(),
        phone.as_str(),
    ];

    tokens.iter().try_fold(0, |total, token| {
        let points = contain(token, &fields);
        (points > 0).then_some(total + points)
    })
}

/// Rank `users` (in their list order) against `query`.
///
/// Scanning stops once `limit` candidates are admitted; the admitted set is
/// then stably sorted by score, highest first. A blank query admits the
/// first `limit` users unchanged.
pub fn rank(users: &[User], query: &str, limit: usize) -> Vec<User> {
    let query = query.to_lowercase();
    let tokens: Vec<&str> = query.split_ascii_whitespace().collect();

    let mut admitted: Vec<(i64, &User)> = Vec::new();
    for user in users {
        if admitted.len() >= limit {
            break;
        }
        if let Some(points) = score(user, &tokens) {
            admitted.push((points, user));
        }
    }

    admitted.sort_by(|a, b| b.0.cmp(&a.0));
    admitted.into_iter().map(|(_, user)| user.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, lname: &str, email: &str) -> User {
        User {
            name: name.to_string(),
            lname: lname.to_string(),
            email: email.to_string(),
            ..User::default()
        }
    }

    /// Federation list order: `lname` descending.
    fn federation() -> Vec<User> {
        vec![
            user("Bob", "Carter", "bob@x"),
            user("Alice", "Brown", "alice@x"),
            user("Allen", "Baker", "allen@x"),
        ]
    }

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn test_contain_exact_prefix_substring() {
        // exact 5 + prefix 3 + bonus 0 + substring 1
        assert_eq!(contain("bob", &["Bob"]), 9);
        // prefix 3 + bonus 3 + substring 1
        assert_eq!(contain("al", &["Alice"]), 7);
        // substring only
        assert_eq!(contain("ice", &["Alice"]), 1);
        assert_eq!(contain("zed", &["Alice"]), 0);
    }

    #[test]
    fn test_contain_no_bonus_for_long_fields() {
        // "alexandria" is 8 characters longer than "al": prefix 3 + substring 1
        assert_eq!(contain("al", &["Alexandria"]), 4);
    }

    #[test]
    fn test_search_single_exact_name() {
        assert_eq!(names(&rank(&federation(), "alice", 50)), ["Alice"]);
    }

    #[test]
    fn test_search_shared_prefix_keeps_list_order_on_tie() {
        assert_eq!(names(&rank(&federation(), "al", 50)), ["Alice", "Allen"]);
    }

    #[test]
    fn test_search_every_token_must_match() {
        assert_eq!(names(&rank(&federation(), "al brown", 50)), ["Alice"]);
    }

    #[test]
    fn test_search_unknown() {
        assert!(rank(&federation(), "unknown", 50).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        assert_eq!(names(&rank(&federation(), "BOB", 50)), ["Bob"]);
    }

    #[test]
    fn test_search_matches_phone() {
        let mut users = federation();
        users[2].phone = 79_001_234_567;
        assert_eq!(names(&rank(&users, "7900", 50)), ["Allen"]);
    }

    #[test]
    fn test_higher_score_sorts_first() {
        let users = vec![user("Bobby", "Stone", "b@x"), user("Bob", "Carter", "bob@x")];
        // Exact name match on the second user outranks the prefix-only first.
        assert_eq!(names(&rank(&users, "bob", 50)), ["Bob", "Bobby"]);
    }

    #[test]
    fn test_blank_query_admits_list_prefix() {
        assert_eq!(names(&rank(&federation(), "   ", 2)), ["Bob", "Alice"]);
    }

    #[test]
    fn test_limit_applies_before_sorting() {
        let users: Vec<User> = (0..60)
            .map(|i| user(&format!("user{i:02}"), "Same", &format!("user{i:02}@x")))
            .collect();
        let found = rank(&users, "user", 50);
        assert_eq!(found.len(), 50);
        assert_eq!(found.last().map(|u| u.name.as_str()), Some("user49"));
        assert_eq!(found.first().map(|u| u.name.as_str()), Some("user00"));
    }

    #[test]
    fn test_search_is_stable() {
        let users = federation();
        assert_eq!(rank(&users, "al", 50), rank(&users, "al", 50));
    }
}
