use numpress::cli;

fn main() {
	env_logger::init();
	if let Err(e) = cli::run() {
		if e.is_fatal() {
			log::error!("fatal: {}", e);
		}
		eprintln!("Error: {}", e);
		std::process::exit(1);
	}
}
