/// Display version information
pub fn execute() {
    println!("custos {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for the Custos quorum authorization engine");
}
