//! Console output for the operator: the startup banner and the pairing-code
//! box shown again after every disconnect.

use crate::server::Server;

const INNER_WIDTH: usize = 58;

pub fn print_banner(server: &Server) {
    let code = server
        .pairing_code()
        .unwrap_or_else(|| "------".to_owned());
    let rule = "═".repeat(INNER_WIDTH);

    println!();
    println!("╔{rule}╗");
    println!("║{:^INNER_WIDTH$}║", "HOTSPOT KEYBOARD & MOUSE SERVER");
    println!("║{:^INNER_WIDTH$}║", server.server_name());
    println!("╠{rule}╣");
    println!("║  IP address:     {:<39} ║", server.local_ip());
    println!("║  Discovery:      UDP {:<35} ║", server.discovery_port());
    println!("║  Input:          UDP {:<35} ║", server.input_port());
    println!("║  Control:        TCP {:<35} ║", server.control_port());
    println!("╠{rule}╣");
    println!("║  PAIRING CODE:   {:<39} ║", code);
    println!("╚{rule}╝");
    println!();
}

pub fn print_pairing_code(code: &str) {
    let rule = "═".repeat(30);
    println!("╔{rule}╗");
    println!("║  Pairing code:  {code:<12} ║");
    println!("╚{rule}╝");
}
