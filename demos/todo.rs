//! Demonstration of a modular store: todos, a namespaced module, a
//! persistence plugin and an asynchronous action.

use modstore::{ModuleOptions, Store, StoreError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stand-in for durable storage.
type Storage = Arc<Mutex<Option<String>>>;

fn persist(storage: Storage) -> impl Fn(&Store) + Send + Sync + 'static {
    move |store: &Store| {
        let saved = storage.lock().ok().and_then(|s| s.clone());
        if let Some(state) = saved.and_then(|s| serde_json::from_str::<Value>(&s).ok()) {
            store.replace_state(state);
        }

        let storage = storage.clone();
        store.subscribe(move |_, state| {
            if let Ok(mut slot) = storage.lock() {
                *slot = serde_json::to_string(state).ok();
            }
        });
    }
}

fn increment(state: &mut Value, payload: &Value) {
    let age = state["age"].as_i64().unwrap_or(0);
    state["age"] = json!(age + payload.as_i64().unwrap_or(0));
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Modstore Example: Todo App ===\n");

    let storage: Storage = Arc::new(Mutex::new(None));

    let store = Store::builder()
        .strict(true)
        .plugin(persist(storage.clone()))
        .plugin(|store| {
            store.subscribe(|mutation, _| {
                println!("   [mutation] {} {}", mutation.kind, mutation.payload);
            });
        })
        .state(json!({
            "todos": [
                {"id": 0, "done": true, "text": "Learn Rust"},
                {"id": 1, "done": false, "text": "Build a store"},
                {"id": 2, "done": false, "text": "Write documentation"},
            ],
            "status": "idle",
        }))
        .getter("doneTodosCount", |state| {
            let done = state["todos"]
                .as_array()
                .map(|todos| todos.iter().filter(|t| t["done"] == json!(true)).count())
                .unwrap_or(0);
            json!(done)
        })
        .mutation("syncTodoDone", |state, id| {
            if let Some(todo) = id.as_u64().and_then(|i| state["todos"].get_mut(i as usize)) {
                todo["done"] = json!(true);
            }
        })
        .mutation("syncChange", |state, payload| state["status"] = payload.clone())
        .action("asyncChange", |store: Store, payload| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            store.commit("syncChange", payload)?;
            Ok::<_, StoreError>(Value::Null)
        })
        .module(
            "a",
            ModuleOptions::new()
                .namespaced(true)
                .state(json!({"age": 18}))
                .mutation("increment", increment)
                .getter("isAdult", |state| json!(state["age"].as_i64() >= Some(18))),
        )
        .build()?;

    println!("1. Done todos: {}", store.getter("doneTodosCount")?);

    println!("\n2. Completing todo 1");
    store.commit("syncTodoDone", 1)?;
    println!("   Done todos: {}", store.getter("doneTodosCount")?);

    println!("\n3. Namespaced module");
    store.commit("a/increment", 5)?;
    println!("   a.age = {}", store.state()["a"]["age"]);
    if let Err(err) = store.commit("increment", 5) {
        println!("   unqualified commit rejected: {err}");
    }

    println!("\n4. Registering module b at runtime");
    store.register_module(
        "b",
        ModuleOptions::new()
            .state(json!({"b": "b"}))
            .mutation("syncChangeB", |state, _| state["b"] = json!("bb")),
    )?;
    store.commit("syncChangeB", ())?;
    println!("   b = {}", store.state()["b"]);

    println!("\n5. Dispatching an asynchronous action");
    store.dispatch("asyncChange", "done")?.await?;
    println!("   status = {}", store.state()["status"]);

    println!("\n6. Strict mode");
    store.with_state_mut(|state| state["status"] = json!("tampered"));
    for violation in store.strict_violations() {
        println!("   {violation}");
    }

    let saved = storage.lock().ok().and_then(|s| s.clone()).unwrap_or_default();
    println!("\n7. Persisted {} bytes of state", saved.len());

    println!("\n✓ Example complete!");
    Ok(())
}
