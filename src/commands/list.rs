//! List command implementation

use vspidev_core::CommandRegistry;

/// List all registered spidev commands
pub fn list_commands(registry: &CommandRegistry) {
    println!("Registered spidev commands:");
    println!();
    println!("{:<26} {:>10}  {:<6} {:>3} {:>5}", "Command", "Code", "Dir", "Nr", "Size");
    println!("{}", "-".repeat(56));

    for entry in registry.entries().chain(registry.batch_entries()) {
        let code = entry.code;
        println!(
            "{:<26} 0x{:08X}  {:<6} {:>3} {:>5}",
            entry.kind.to_string(),
            code.raw(),
            code.direction().to_string(),
            code.number(),
            code.size()
        );
    }

    println!();
    println!("SPI_IOC_MESSAGE(N) is accepted for any N up to 511 (32 bytes per transfer).");
}
