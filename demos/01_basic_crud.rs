//! Example 01: Basic CRUD Operations
//!
//! This example walks through the collection operations of a store backed by
//! an in-memory medium.
//!
//! Run with: cargo run --example 01_basic_crud

use eyre::Result;
use localstore::{KeyValueStore, MemoryMedium, RemoveOutcome, Task, UpdateOutcome};

fn main() -> Result<()> {
    println!("localstore Basic CRUD Example");
    println!("=============================\n");

    let mut store = KeyValueStore::new(MemoryMedium::new());

    // A collection must exist before anything can be appended to it
    println!("1. INIT - Creating the 'tasks' collection...");
    store.init_collection("tasks")?;
    println!("   Raw value: {:?}\n", store.get_raw("tasks")?);

    // CREATE: Append two tasks
    println!("2. CREATE - Adding tasks...");
    store.save("tasks", &Task::new(1, "Write the README", false, false, 2.0))?;
    store.save("tasks", &Task::new(2, "Tag a release", false, false, 1.0))?;
    println!("   Stored {} tasks\n", store.find_all("tasks")?.map(|t| t.len()).unwrap_or(0));

    // READ: Look one up by id
    println!("3. READ - Retrieving task 2...");
    match store.find_by_id_as::<Task>("tasks", 2)? {
        Some(task) => {
            println!("   Found task:");
            println!("   - ID: {}", task.id());
            println!("   - Description: {}", task.description());
            println!("   - Priority: {}", task.priority());
        }
        None => println!("   Task not found!"),
    }
    println!();

    // UPDATE: Complete task 1
    println!("4. UPDATE - Completing task 1...");
    if let Some(mut task) = store.find_by_id_as::<Task>("tasks", 1)? {
        task.set_completed(true);
        task.set_updated_at(localstore::now_ms());
        let outcome = store.update_by_id("tasks", 1, &task)?;
        println!("   Outcome: {:?}\n", outcome);
        assert_eq!(outcome, UpdateOutcome::Updated);
    }

    // LIST: Show all tasks
    println!("5. LIST - Showing all tasks...");
    let tasks: Vec<Task> = store.records()?;
    for task in &tasks {
        let mark = if task.completed() { "x" } else { " " };
        println!("   [{}] {} : {}", mark, task.id(), task.description());
    }
    println!();

    // DELETE: Remove task 2, then try again
    println!("6. DELETE - Removing task 2...");
    println!("   First attempt: {:?}", store.remove_by_id("tasks", 2)?);
    let second = store.remove_by_id("tasks", 2)?;
    println!("   Second attempt: {:?}\n", second);
    assert_eq!(second, RemoveOutcome::NotFound);

    println!("Example complete!");
    Ok(())
}
