use concord::ledger::SCHEMA_VERSION;

/// Display version information
pub fn execute() {
    println!("concord {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for Concord forum governance");
    println!("Ledger schema: v{}", SCHEMA_VERSION);
}
