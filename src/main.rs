use vgame::cli;

fn main() {
    env_logger::init();
    std::process::exit(cli::run());
}
