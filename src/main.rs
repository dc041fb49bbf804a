fn main() {
    if let Err(err) = card_ledger::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
