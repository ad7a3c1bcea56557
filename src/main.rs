fn main() -> std::process::ExitCode {
    growthlens_lib::run()
}
