//! Render the SQL an enum migration would run
//!
//! Loads a definition from the YAML or JSON file given as the first argument
//! and prints the upgrade and downgrade scripts without touching a database.
//!
//! ```text
//! cargo run --example render_script -- state_enum.yml
//! ```

use enum_migration::{EnumMigration, EnumMigrationDefinition, EnumMigrationResult, SqlScript};

#[tokio::main]
async fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: render_script <definition.yml|definition.json>");
        std::process::exit(2);
    };

    if let Err(e) = render(&path).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn render(path: &str) -> EnumMigrationResult<()> {
    let definition = EnumMigrationDefinition::from_file(path)?;
    let mut migration = EnumMigration::from_definition(SqlScript::new(), definition)?;

    migration.upgrade().await?;
    println!("-- upgrade {}", migration.enum_name());
    print!("{}", migration.executor().to_sql());

    migration.executor_mut().clear();
    migration.downgrade().await?;
    println!("\n-- downgrade {}", migration.enum_name());
    print!("{}", migration.executor().to_sql());

    Ok(())
}
