use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use recipe_box_lib::config::Config;
use recipe_box_lib::domain::{Capability, User};
use recipe_box_lib::repository::Database;
use recipe_box_lib::routes::build_router;
use recipe_box_lib::AppState;
use recipe_editor::{EditAction, EditorSession, ListField, RecipeClient};
use tokio::net::TcpListener;

/// Serve an in-memory recipe server, return its origin
async fn spawn_server() -> String {
    let mut config = Config::default();
    config.users = vec![
        User {
            id: 1,
            name: "alice".to_string(),
            capabilities: vec![Capability::EditRecipe],
        },
        User {
            id: 2,
            name: "bob".to_string(),
            capabilities: vec![Capability::EditAnyRecipe],
        },
    ];
    let db = Database::open_in_memory(Duration::from_millis(200)).unwrap();
    let app = build_router(AppState::new(Arc::new(db.recipe_store()), &config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_two_editors_over_http() {
    let origin = spawn_server().await;
    let alice = RecipeClient::new(&origin, "/recipe").with_user(1);
    let bob = RecipeClient::new(&origin, "/recipe").with_user(2);

    let model = alice.create_recipe().await.unwrap();
    let id = model.recipe.id;
    let mut alice_session = EditorSession::new(alice.clone(), model);

    // bob opens the same recipe and preempts alice
    let mut bob_session = EditorSession::new(bob.clone(), bob.open_editor(id).await.unwrap());

    alice_session.dispatch(EditAction::SetTitle("Alice's pie".to_string()));
    let err = alice_session.save().await.unwrap_err();
    assert!(err.is_conflict());
    assert!(alice_session.state().last_error.as_deref().unwrap_or_default().contains("bob"));

    bob_session.dispatch(EditAction::InsertAfterSelected(ListField::Ingredients));
    bob_session.dispatch(EditAction::SetSelectedValue(ListField::Ingredients, "salt".to_string()));
    bob_session.save().await.unwrap();

    let salt = &bob_session.state().recipe.ingredients.elems[1];
    assert!(!salt.is_temp);
    assert!(salt.id > 0);
    assert!(!bob_session.state().has_change());

    // a second save with the rotated key succeeds
    bob_session.dispatch(EditAction::SetTitle("Salted pie".to_string()));
    bob_session.save().await.unwrap();

    let view = alice.view_recipe(id).await.unwrap();
    assert_eq!(view.title, "Salted pie");
    assert_eq!(view.ingredients, vec!["".to_string(), "salt".to_string()]);
}

#[tokio::test]
async fn test_listing_publish_and_delete() {
    let origin = spawn_server().await;
    let alice = RecipeClient::new(&origin, "/recipe").with_user(1);
    let anonymous = RecipeClient::new(&origin, "/recipe");

    let id = alice.create_recipe().await.unwrap().recipe.id;
    assert_eq!(alice.my_recipes().await.unwrap().recipes.len(), 1);
    assert!(anonymous.list_published().await.unwrap().is_empty());

    let err = anonymous.my_recipes().await.unwrap_err();
    assert_eq!(err.to_string(), "Not authorized");

    assert!(alice.set_published(id, true).await.unwrap().is_published);
    assert_eq!(anonymous.list_published().await.unwrap().len(), 1);
    assert!(!anonymous.view_recipe(id).await.unwrap().can_edit);

    alice.delete_recipe(id).await.unwrap();
    assert!(anonymous.view_recipe(id).await.is_err());
}
