use serde_json::json;

use super::*;

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[test]
fn profile_top_level_shape() {
    let body = json!({"username": "alice", "is_private": false, "following_count": 120, "pk": 42});
    let p = normalize_profile(&body).expect("profile");
    assert_eq!(p.username, "alice");
    assert!(!p.is_private);
    assert_eq!(p.following_count, 120);
    assert_eq!(p.user_id.as_deref(), Some("42"));
}

#[test]
fn profile_under_user_wrapper() {
    let body = json!({"user": {"username": "bob", "is_private": true, "following_count": "77"}});
    let p = normalize_profile(&body).expect("profile");
    assert_eq!(p.username, "bob");
    assert!(p.is_private);
    assert_eq!(p.following_count, 77);
}

#[test]
fn profile_under_data_user_with_edge_follow() {
    let body = json!({"data": {"user": {"username": "carol", "edge_follow": {"count": 310}, "id": "9001"}}});
    let p = normalize_profile(&body).expect("profile");
    assert_eq!(p.username, "carol");
    assert_eq!(p.following_count, 310);
    assert_eq!(p.user_id.as_deref(), Some("9001"));
}

#[test]
fn profile_under_data_user_with_plain_following_count() {
    let body = json!({"data": {"user": {"username": "dave", "following_count": 15}}});
    assert_eq!(normalize_profile(&body).unwrap().following_count, 15);
}

#[test]
fn profile_under_data_user_with_edge_follow_count() {
    let body = json!({"data": {"user": {"username": "erin", "edge_follow_count": 8}}});
    assert_eq!(normalize_profile(&body).unwrap().following_count, 8);
}

#[test]
fn profile_under_graphql_user() {
    let body = json!({"graphql": {"user": {"username": "frank", "is_private": 1, "edge_follow": {"count": 3}}}});
    let p = normalize_profile(&body).expect("profile");
    assert_eq!(p.username, "frank");
    assert!(p.is_private);
    assert_eq!(p.following_count, 3);
}

#[test]
fn profile_under_profile_wrapper() {
    let body = json!({"profile": {"username": "gina", "following_count": 4.0}});
    assert_eq!(normalize_profile(&body).unwrap().following_count, 4);
}

#[test]
fn earlier_strategy_wins_when_several_match() {
    let body = json!({
        "username": "top",
        "following_count": 1,
        "user": {"username": "nested", "following_count": 2}
    });
    let p = normalize_profile(&body).unwrap();
    assert_eq!(p.username, "top");
    assert_eq!(p.following_count, 1);
}

#[test]
fn empty_username_falls_through_to_next_strategy() {
    let body = json!({"username": "  ", "user": {"username": "real", "following_count": 5}});
    assert_eq!(normalize_profile(&body).unwrap().username, "real");
}

#[test]
fn absent_fields_default() {
    let body = json!({"username": "minimal"});
    let p = normalize_profile(&body).unwrap();
    assert!(!p.is_private);
    assert_eq!(p.following_count, 0);
    assert!(p.user_id.is_none());
}

#[test]
fn garbage_counts_coerce_to_zero() {
    for count in [json!(-5), json!("lots"), json!(true), json!([1]), json!({"n": 1})] {
        let body = json!({"username": "x", "following_count": count});
        assert_eq!(normalize_profile(&body).unwrap().following_count, 0, "{count}");
    }
}

#[test]
fn profile_normalizer_is_total() {
    let inputs = [
        json!(null),
        json!(42),
        json!("username"),
        json!([]),
        json!([{"username": "in-an-array"}]),
        json!({}),
        json!({"user": null}),
        json!({"user": "alice"}),
        json!({"data": {"user": []}}),
        json!({"username": 17}),
    ];
    for input in &inputs {
        assert!(normalize_profile(input).is_none(), "{input}");
    }
}

// ---------------------------------------------------------------------------
// Username lists
// ---------------------------------------------------------------------------

#[test]
fn list_from_bare_array() {
    let body = json!([{"username": "a"}, {"user": {"username": "b"}}]);
    assert_eq!(normalize_usernames(&body), vec!["a", "b"]);
}

#[test]
fn list_from_users_wrapper() {
    let body = json!({"users": [{"username": "a"}, {"username": null}, {"username": ""}, {"username": "c"}]});
    assert_eq!(normalize_usernames(&body), vec!["a", "c"]);
}

#[test]
fn list_from_data_users() {
    let body = json!({"data": {"users": [{"username": "a"}]}});
    assert_eq!(normalize_usernames(&body), vec!["a"]);
}

#[test]
fn list_from_graph_edges_under_each_parent() {
    let edges = json!({"edges": [{"node": {"username": "n1"}}, {"node": {}}, {"node": {"username": "n2"}}]});
    let bodies = [
        json!({"data": {"user": {"edge_follow": edges.clone()}}}),
        json!({"profile": {"edge_follow": edges.clone()}}),
        json!({"user": {"edge_follow": edges.clone()}}),
        json!({"graphql": {"user": {"edge_follow": edges.clone()}}}),
        edges.clone(),
    ];
    for body in &bodies {
        assert_eq!(normalize_usernames(body), vec!["n1", "n2"], "{body}");
    }
}

#[test]
fn list_from_plain_username_strings() {
    let body = json!({"following": ["a", "", "b"]});
    assert_eq!(normalize_usernames(&body), vec!["a", "b"]);
}

#[test]
fn list_from_items_and_response_users() {
    assert_eq!(
        normalize_usernames(&json!({"items": [{"username": "i"}]})),
        vec!["i"]
    );
    assert_eq!(
        normalize_usernames(&json!({"response": {"users": [{"username": "r"}]}})),
        vec!["r"]
    );
}

#[test]
fn first_present_array_wins_even_if_empty() {
    let body = json!({"users": [], "items": [{"username": "ignored"}]});
    assert!(normalize_usernames(&body).is_empty());
}

#[test]
fn list_duplicates_are_kept() {
    let body = json!({"users": [{"username": "a"}, {"username": "a"}]});
    assert_eq!(normalize_usernames(&body), vec!["a", "a"]);
}

#[test]
fn list_normalizer_is_total() {
    let inputs = [
        json!(null),
        json!(1),
        json!("users"),
        json!({}),
        json!({"users": "not-an-array"}),
        json!({"users": {"0": {"username": "a"}}}),
        json!({"end_cursor": "abc"}),
        json!([1, 2, null, [], {}]),
    ];
    for input in &inputs {
        assert!(normalize_usernames(input).is_empty(), "{input}");
    }
}

// ---------------------------------------------------------------------------
// Media, cursors, user ids, error bodies
// ---------------------------------------------------------------------------

#[test]
fn media_shapes_in_priority_order() {
    assert_eq!(normalize_media(&json!({"items": [1, 2]})).len(), 2);
    assert_eq!(normalize_media(&json!({"data": {"items": [1]}})).len(), 1);
    assert_eq!(normalize_media(&json!({"media": [1, 2, 3]})).len(), 3);
    assert_eq!(normalize_media(&json!({"data": {"media": [1]}})).len(), 1);
    assert!(normalize_media(&json!({"nothing": true})).is_empty());
}

#[test]
fn cursor_paths() {
    assert_eq!(next_cursor(&json!({"next_max_id": "abc"})).as_deref(), Some("abc"));
    assert_eq!(next_cursor(&json!({"next_max_id": 123})).as_deref(), Some("123"));
    assert_eq!(next_cursor(&json!({"data": {"next_max_id": "d"}})).as_deref(), Some("d"));
    assert_eq!(next_cursor(&json!({"end_cursor": "e"})).as_deref(), Some("e"));
    assert_eq!(
        next_cursor(&json!({"page_info": {"end_cursor": "p"}})).as_deref(),
        Some("p")
    );
}

#[test]
fn empty_or_null_cursor_means_last_page() {
    assert!(next_cursor(&json!({"next_max_id": ""})).is_none());
    assert!(next_cursor(&json!({"next_max_id": null})).is_none());
    assert!(next_cursor(&json!({})).is_none());
    assert!(next_cursor(&json!([])).is_none());
}

#[test]
fn user_id_paths() {
    assert_eq!(normalize_user_id(&json!({"UserID": 1})).as_deref(), Some("1"));
    assert_eq!(normalize_user_id(&json!({"user_id": "2"})).as_deref(), Some("2"));
    assert_eq!(normalize_user_id(&json!({"data": {"pk": 3}})).as_deref(), Some("3"));
    assert_eq!(
        normalize_user_id(&json!({"data": {"user": {"pk": "4"}}})).as_deref(),
        Some("4")
    );
    assert_eq!(
        normalize_user_id(&json!({"graphql": {"user": {"id": "5"}}})).as_deref(),
        Some("5")
    );
    assert_eq!(normalize_user_id(&json!({"id_str": "6"})).as_deref(), Some("6"));
    assert!(normalize_user_id(&json!({"user_id": ""})).is_none());
    assert!(normalize_user_id(&json!(null)).is_none());
}

#[test]
fn error_body_detection() {
    assert_eq!(
        error_message(&json!({"status": "error", "error": "Rate limit"})).as_deref(),
        Some("Rate limit")
    );
    assert_eq!(
        error_message(&json!({"status": "error"})).as_deref(),
        Some("unknown error")
    );
    assert_eq!(
        error_message(&json!({"message": "You are not subscribed to this API."})).as_deref(),
        Some("You are not subscribed to this API.")
    );
    assert!(error_message(&json!({"status": "ok", "message": "fine"})).is_none());
    assert!(error_message(&json!({"username": "alice"})).is_none());
    assert!(error_message(&json!([])).is_none());
}
