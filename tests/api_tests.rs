// tests/api_tests.rs
//
// End-to-end flows against a real Postgres. Skipped when DATABASE_URL is unset.

use std::str::FromStr;

use mockito::{Server, ServerGuard};
use quiz_backend::{
    config::{Config, ScrapeConfig},
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

fn database_url() -> Option<String> {
    let url = std::env::var("DATABASE_URL").ok();
    if url.is_none() {
        eprintln!("DATABASE_URL not set, skipping database test");
    }
    url
}

/// App on the shared database.
async fn spawn_app() -> Option<String> {
    let database_url = database_url()?;
    let options = PgConnectOptions::from_str(&database_url).expect("Invalid DATABASE_URL");
    Some(serve(database_url, options).await)
}

/// App on a schema of its own, for assertions about the whole store.
async fn spawn_isolated_app() -> Option<String> {
    let database_url = database_url()?;
    let schema = format!("t_{}", uuid::Uuid::new_v4().simple());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");
    sqlx::query(&format!(r#"CREATE SCHEMA "{}""#, schema))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");

    let options = PgConnectOptions::from_str(&database_url)
        .expect("Invalid DATABASE_URL")
        .options([("search_path", schema.as_str())]);
    Some(serve(database_url, options).await)
}

async fn serve(database_url: String, options: PgConnectOptions) -> String {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        session_secret: "api_test_secret".to_string(),
        session_ttl_secs: 600,
        session_cookie_name: "quiz_session".to_string(),
        cookie_secure: false,
        rust_log: "error".to_string(),
        port: 0,
        frontend_url: "http://localhost:3000".to_string(),
        public_url: "http://localhost:5000".to_string(),
        github_client_id: None,
        github_client_secret: None,
        scrape: ScrapeConfig {
            timeout_secs: 5,
            retry_attempts: 0,
            retry_delay_ms: 0,
        },
        llm_providers: Vec::new(),
    };

    let state = AppState::new(pool, config).expect("Failed to build state");
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

fn indiabix_page(question: &str, answer: &str) -> String {
    format!(
        r#"<html><body>
        <div class="bix-div-container">
          <div class="bix-td-qtxt">{}</div>
          <div class="bix-td-option-val">Ohm</div>
          <div class="bix-td-option-val">Volt</div>
          <div class="bix-td-option-val">Ampere</div>
          <input type="hidden" class="jq-hdnakq" value="{}">
          <div class="bix-ans-description">Stored explanation.</div>
        </div>
        </body></html>"#,
        question, answer
    )
}

/// Mock question bank plus a quiz set scraped from it: three questions.
async fn scraped_quiz_set(address: &str, client: &reqwest::Client) -> (ServerGuard, String) {
    let mut server = Server::new_async().await;
    for (n, answer) in [(1, "A"), (2, "B"), (3, "C")] {
        server
            .mock("GET", format!("/indiabix/q-{}", n).as_str())
            .with_body(indiabix_page(&format!("Question {}", n), answer))
            .create_async()
            .await;
    }

    let response = client
        .post(format!("{}/api/startScraping", address))
        .json(&json!({
            "title": format!("Set {}", uuid::Uuid::new_v4()),
            "rawUrls": "indiabix 1-3",
            "urls": [
                { "base_url": format!("{}/indiabix/q-", server.url()), "start_url": "1", "end_url": 3 }
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Scraping completed.");
    let id = body["quiz_set_id"].as_str().expect("quiz_set_id missing").to_string();

    (server, id)
}

fn sorted_ids(questions: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = questions
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    ids.sort();
    ids
}

async fn get_json(client: &reqwest::Client, url: String) -> (u16, Value) {
    let response = client.get(url).send().await.expect("Failed to execute request");
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn scraping_creates_ordered_questions() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (_server, id) = scraped_quiz_set(&address, &client).await;

    let (status, questions) =
        get_json(&client, format!("{}/api/getQuestionsByQuizSet/{}", address, id)).await;
    assert_eq!(status, 200);

    let questions = questions.as_array().unwrap();
    assert_eq!(questions.len(), 3);
    let orders: Vec<i64> = questions.iter().map(|q| q["order"].as_i64().unwrap()).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(questions[1]["answer"], "Option B");
    assert_eq!(questions[1]["options"], json!(["Ohm", "Volt", "Ampere"]));
    assert_eq!(questions[0]["explanation"], "Stored explanation.");

    let (_, raw) = get_json(&client, format!("{}/api/getRawUrls/{}", address, id)).await;
    assert_eq!(raw["rawUrls"], "indiabix 1-3");
}

#[tokio::test]
async fn invalid_descriptor_is_rejected_before_creating_a_set() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/startScraping", address))
        .json(&json!({
            "title": "Broken",
            "urls": [{ "base_url": "https://www.indiabix.com/x/", "start_url": "one" }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn answering_shuffling_and_attempts() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (_server, id) = scraped_quiz_set(&address, &client).await;

    let (_, questions) =
        get_json(&client, format!("{}/api/getQuestionsByQuizSet/{}", address, id)).await;
    let first_id = questions[0]["id"].as_i64().unwrap();
    let ids_before = sorted_ids(&questions);

    // Answer one of three: progress floors to 33.
    let response = client
        .post(format!("{}/api/updateUserSelection", address))
        .json(&json!({ "question_id": first_id, "selected_option": "Option A" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let (_, details) = get_json(&client, format!("{}/api/getQuizSetDetails/{}", address, id)).await;
    assert_eq!(details["progress"], 33);
    assert_eq!(details["answered_questions"], 1);

    let (_, score) = get_json(&client, format!("{}/api/getQuizSetScore/{}", address, id)).await;
    assert_eq!(score, json!({ "score": 1, "total_questions": 3 }));

    let (_, selections) =
        get_json(&client, format!("{}/api/getUserSelections/{}", address, id)).await;
    assert_eq!(selections[first_id.to_string()], "Option A");

    // Shuffle: a permutation of 1..=3 with selections cleared.
    let shuffled: Value = client
        .post(format!("{}/api/shuffleQuestions/{}", address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut orders: Vec<i64> = shuffled
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["order"].as_i64().unwrap())
        .collect();
    orders.sort();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(sorted_ids(&shuffled), ids_before);
    assert!(shuffled.as_array().unwrap().iter().all(|q| q["user_selected_option"].is_null()));

    // Two attempts, oldest first.
    for score in [1, 3] {
        let response = client
            .post(format!("{}/api/updateQuizSetScore/{}", address, id))
            .json(&json!({ "score": score }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let (_, attempts) = get_json(&client, format!("{}/api/getAttempts/{}", address, id)).await;
    let scores: Vec<i64> = attempts
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["score"].as_i64().unwrap())
        .collect();
    assert_eq!(scores, vec![1, 3]);

    let (_, sets) = get_json(&client, format!("{}/api/getQuizSets", address)).await;
    let summary = sets
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == id.as_str())
        .expect("quiz set missing from list");
    assert_eq!(summary["attempts"], 2);
    assert_eq!(summary["latest_score"], 3);
    assert_eq!(summary["average_score"], 2.0);
    assert_eq!(summary["finished"], true);
    assert_eq!(summary["progress"], 100);
}

#[tokio::test]
async fn quiz_set_view_state_and_deletion() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (_server, id) = scraped_quiz_set(&address, &client).await;

    let response = client
        .put(format!("{}/api/renameQuizSet/{}", address, id))
        .json(&json!({ "new_title": "Circuits" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let toggled: Value = client
        .post(format!("{}/api/toggleLockState/{}", address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let (_, lock) = get_json(&client, format!("{}/api/getLockState/{}", address, id)).await;
    assert_eq!(lock["lock_state"], toggled["lock_state"]);

    let response = client
        .post(format!("{}/api/updateQuizSetState/{}", address, id))
        .json(&json!({ "index": 2, "filter": "favorites" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let (_, state) = get_json(&client, format!("{}/api/getQuizSetState/{}", address, id)).await;
    assert_eq!(
        state,
        json!({ "current_question_index": 2, "current_filter": "favorites" })
    );

    let pdf = client
        .get(format!("{}/api/downloadQuizPdf/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(pdf.status().as_u16(), 200);
    assert_eq!(pdf.headers()["content-type"], "application/pdf");
    assert!(pdf.bytes().await.unwrap().starts_with(b"%PDF"));

    let response = client
        .delete(format!("{}/api/deleteQuizSet/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let (status, body) = get_json(&client, format!("{}/api/getQuizSetDetails/{}", address, id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Quiz set not found");

    let (status, questions) =
        get_json(&client, format!("{}/api/getQuestionsByQuizSet/{}", address, id)).await;
    assert_eq!(status, 200);
    assert_eq!(questions, json!([]));

    // Deleting it again finds nothing.
    let response = client
        .delete(format!("{}/api/deleteQuizSet/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Quiz set not found" }));
}

#[tokio::test]
async fn deleting_an_unknown_quiz_set_is_404() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();

    let response = client
        .delete(format!("{}/api/deleteQuizSet/{}", address, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Quiz set not found" }));
}

#[tokio::test]
async fn empty_store_lists_no_quiz_sets() {
    let Some(address) = spawn_isolated_app().await else { return };
    let client = reqwest::Client::new();

    let (status, sets) = get_json(&client, format!("{}/api/getQuizSets", address)).await;
    assert_eq!(status, 200);
    assert_eq!(sets, json!([]));
}

#[tokio::test]
async fn favorites_toggle_back_and_reset_keeps_questions() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (_server, id) = scraped_quiz_set(&address, &client).await;

    let (_, before) =
        get_json(&client, format!("{}/api/getQuestionsByQuizSet/{}", address, id)).await;
    let question_id = before[1]["id"].as_i64().unwrap();
    let original = before[1]["favorite"].as_bool().unwrap();

    let mut seen = Vec::new();
    for _ in 0..2 {
        let toggled: Value = client
            .post(format!("{}/api/toggleFavorite", address))
            .json(&json!({ "question_id": question_id }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        seen.push(toggled["favorite"].as_bool().unwrap());
    }
    assert_eq!(seen, vec![!original, original]);

    // Answer everything, then reset.
    for q in before.as_array().unwrap() {
        let response = client
            .post(format!("{}/api/updateUserSelection", address))
            .json(&json!({ "question_id": q["id"], "selected_option": "Option A" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = client
        .post(format!("{}/api/resetQuestions/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let (_, after) =
        get_json(&client, format!("{}/api/getQuestionsByQuizSet/{}", address, id)).await;
    let keep = |qs: &Value| -> Vec<(Value, Value, Value, Value)> {
        qs.as_array()
            .unwrap()
            .iter()
            .map(|q| (q["id"].clone(), q["order"].clone(), q["text"].clone(), q["answer"].clone()))
            .collect()
    };
    assert_eq!(keep(&after), keep(&before));
    assert!(after.as_array().unwrap().iter().all(|q| q["user_selected_option"].is_null()));
}

#[tokio::test]
async fn signup_signin_and_session_status() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let response = client
        .post(format!("{}/api/auth/signup", address))
        .json(&json!({ "name": "Ada", "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let duplicate = client
        .post(format!("{}/api/auth/signup", address))
        .json(&json!({ "name": "Ada", "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 400);

    let wrong = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": email, "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let (_, status) = get_json(&client, format!("{}/api/auth/status", address)).await;
    assert_eq!(status["isLoggedIn"], true);
    assert_eq!(status["username"], "Ada");

    // Editor notes belong to the signed-in user.
    let response = client
        .post(format!("{}/api/saveEditorContent", address))
        .json(&json!({ "content": "<p>notes</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let (_, content) = get_json(&client, format!("{}/api/getEditorContent", address)).await;
    assert_eq!(content["content"], "<p>notes</p>");

    client
        .post(format!("{}/api/auth/logout", address))
        .send()
        .await
        .unwrap();
    let (_, status) = get_json(&client, format!("{}/api/auth/status", address)).await;
    assert_eq!(status["isLoggedIn"], false);
}

#[tokio::test]
async fn further_explanations_keep_history() {
    let Some(address) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let (_server, id) = scraped_quiz_set(&address, &client).await;

    let (_, questions) =
        get_json(&client, format!("{}/api/getQuestionsByQuizSet/{}", address, id)).await;
    let question_id = questions[0]["id"].as_i64().unwrap();

    let (status, _) = get_json(
        &client,
        format!("{}/api/getFurtherExplanation/{}", address, question_id),
    )
    .await;
    assert_eq!(status, 404);

    for text in ["first take", "second take"] {
        let response = client
            .post(format!("{}/api/saveFurtherExplanation", address))
            .json(&json!({ "question_id": question_id, "explanation": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let (_, latest) = get_json(
        &client,
        format!("{}/api/getFurtherExplanation/{}", address, question_id),
    )
    .await;
    assert_eq!(latest["explanation"], "second take");

    let response = client
        .post(format!("{}/api/saveFurtherExplanation", address))
        .json(&json!({ "question_id": -1, "explanation": "orphan" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
