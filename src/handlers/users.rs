use axum::extract::State;
use axum::response::Html;

use crate::error::Result;
use crate::state::AppState;

#[derive(serde::Serialize, Debug)]
struct Person {
    username: &'static str,
    age: u8,
}

const PEOPLE: [Person; 2] = [
    Person {
        username: "Harman",
        age: 20,
    },
    Person {
        username: "Kirat",
        age: 21,
    },
];

pub(crate) async fn get_users(State(state): State<AppState>) -> Result<Html<String>> {
    let mut ctx = tera::Context::new();
    ctx.insert("people", &PEOPLE);
    Ok(state.render("users.html", &ctx)?.into())
}
