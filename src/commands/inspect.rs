//! Request code inspection commands

use vspidev_core::{ioc, CommandRegistry, RequestCode};

fn print_code(registry: &CommandRegistry, code: RequestCode) {
    let fields = code.fields();
    println!("Code:      0x{:08X} ({})", code.raw(), code.raw());
    println!("Direction: {} ({})", fields.direction, fields.direction.bits());
    println!("Type:      0x{:02X} ({})", fields.ty, fields.ty);
    println!("Number:    {}", fields.number);
    println!("Size:      {} bytes", fields.size);
    println!("Command:   {}", registry.resolve_code(code));
}

/// Decode a raw request code
pub fn cmd_decode(registry: &CommandRegistry, raw: u32) -> Result<(), Box<dyn std::error::Error>> {
    print_code(registry, RequestCode::from_raw(raw));
    Ok(())
}

/// Encode a request code from its four fields
pub fn cmd_encode(
    registry: &CommandRegistry,
    direction: u32,
    ty: u32,
    number: u32,
    size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let code = ioc::encode(direction, ty, number, size)?;
    print_code(registry, code);
    Ok(())
}

/// Show the request code for a batch of `count` transfers
pub fn cmd_message(registry: &CommandRegistry, count: u32) -> Result<(), Box<dyn std::error::Error>> {
    let code = registry.message_code(count)?;
    print_code(registry, code);
    Ok(())
}
