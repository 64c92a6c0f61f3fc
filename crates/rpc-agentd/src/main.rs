use std::process::ExitCode;

fn main() -> ExitCode {
    match rpc_agentd::run_agent() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("rpc-agentd: {error}");
            ExitCode::FAILURE
        }
    }
}
