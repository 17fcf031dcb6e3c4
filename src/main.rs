fn main() {
    if let Err(err) = copa_wiz::cli::run() {
        copa_wiz::ui::eprintln_error(&err);
        std::process::exit(copa_wiz::exit::exit_code(&err));
    }
}
