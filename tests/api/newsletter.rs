use newsroom::db::Newsletter;
use serde_json::json;

use crate::helpers::{health_tips, spawn_app};

#[tokio::test]
async fn list_on_empty_store_returns_200_and_empty_array() {
    let app = spawn_app().await;

    let response = app.get("/newsletter-list").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Vec<Newsletter> = response.json().await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn create_returns_201_and_the_record_is_listed() {
    let app = spawn_app().await;

    let response = app.post_newsletter(&health_tips()).await;
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User Registered Successfully");
    let created: Newsletter = serde_json::from_value(body["user"].clone()).unwrap();
    assert_eq!(created.title, "Health Tips");
    assert_eq!(created.author, "Dr. A");
    assert_eq!(created.date, "2024-01-01");
    assert_eq!(created.image_url, "http://x/1.png");
    assert_eq!(created.description, "Eat your vegetables");

    let listed: Vec<Newsletter> = app.get("/newsletter-list").await.json().await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn list_uses_camel_case_fields() {
    let app = spawn_app().await;
    app.post_newsletter(&health_tips()).await;

    let listed: serde_json::Value = app.get("/newsletter-list").await.json().await.unwrap();
    assert_eq!(listed[0]["imageUrl"], "http://x/1.png");
    assert!(listed[0].get("image_url").is_none());
}

#[tokio::test]
async fn duplicate_title_returns_400_and_is_not_inserted() {
    let app = spawn_app().await;

    let first = app.post_newsletter(&health_tips()).await;
    assert_eq!(first.status().as_u16(), 201);

    let second = app.post_newsletter(&health_tips()).await;
    assert_eq!(second.status().as_u16(), 400);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body, json!({ "message": "NewsLetter exists" }));

    let listed: Vec<Newsletter> = app.get("/newsletter-list").await.json().await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn missing_fields_return_400_and_nothing_is_inserted() {
    let app = spawn_app().await;

    let mut test_cases = vec![];
    for field in ["title", "author", "date", "imageUrl", "description"] {
        let mut missing = health_tips();
        missing.as_object_mut().unwrap().remove(field);
        test_cases.push((missing, format!("missing {field}")));

        let mut empty = health_tips();
        empty[field] = json!("");
        test_cases.push((empty, format!("empty {field}")));
    }
    test_cases.push((json!({}), "empty object".to_string()));
    test_cases.push((json!([1, 2]), "not an object".to_string()));

    for (invalid_body, description) in test_cases {
        let response = app.post_newsletter(&invalid_body).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "API did not fail with 400 when the payload was {}",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Please fill all fields", "{description}");
    }

    let listed: Vec<Newsletter> = app.get("/newsletter-list").await.json().await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn non_json_body_is_a_missing_fields_error() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(format!("{}/newsletter-create", app.address))
        .body("title=Health+Tips")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn list_returns_404_with_err_when_the_store_fails() {
    let app = spawn_app().await;
    app.db.close().await;

    let response = app.get("/newsletter-list").await;

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["err"].is_string());
}

#[tokio::test]
async fn records_are_listed_in_creation_order() {
    let app = spawn_app().await;

    for title in ["First", "Second", "Third"] {
        let mut body = health_tips();
        body["title"] = json!(title);
        assert_eq!(app.post_newsletter(&body).await.status().as_u16(), 201);
    }

    let listed: Vec<Newsletter> = app.get("/newsletter-list").await.json().await.unwrap();
    let titles: Vec<_> = listed.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
}

#[tokio::test]
async fn padded_values_are_stored_verbatim() {
    let app = spawn_app().await;

    let mut body = health_tips();
    body["title"] = json!("  Padded  ");
    body["author"] = json!("   ");
    let response = app.post_newsletter(&body).await;
    assert_eq!(response.status().as_u16(), 201);

    let listed: Vec<Newsletter> = app.get("/newsletter-list").await.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "  Padded  ");
    assert_eq!(listed[0].author, "   ");

    // a different title once padding is kept
    let mut body = health_tips();
    body["title"] = json!("Padded");
    assert_eq!(app.post_newsletter(&body).await.status().as_u16(), 201);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_distinct_titles_all_return_201() {
    let app = spawn_app().await;

    let bodies: Vec<_> = (0..8)
        .map(|i| {
            let mut body = health_tips();
            body["title"] = json!(format!("Tips {i}"));
            body
        })
        .collect();
    let responses = futures::future::join_all(bodies.iter().map(|b| app.post_newsletter(b))).await;

    for response in responses {
        assert_eq!(response.status().as_u16(), 201);
    }
    let listed: Vec<Newsletter> = app.get("/newsletter-list").await.json().await.unwrap();
    assert_eq!(listed.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_same_title_create_exactly_one() {
    let app = spawn_app().await;

    let body = health_tips();
    let responses = futures::future::join_all((0..4).map(|_| app.post_newsletter(&body))).await;

    let mut created = 0;
    for response in responses {
        match response.status().as_u16() {
            201 => created += 1,
            400 => {
                let body: serde_json::Value = response.json().await.unwrap();
                assert_eq!(body, json!({ "message": "NewsLetter exists" }));
            }
            status => panic!("unexpected status {status}"),
        }
    }
    assert_eq!(created, 1);
    let listed: Vec<Newsletter> = app.get("/newsletter-list").await.json().await.unwrap();
    assert_eq!(listed.len(), 1);
}
