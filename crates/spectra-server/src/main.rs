mod cli;
mod http;

fn main() {
    std::process::exit(cli::run_from_env());
}
