use clap::Parser;
use modfence::cli::{Cli, Command, VerifyArgs};
use modfence::{cmd_init, cmd_tree, cmd_verify};

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Some(Command::Verify(args)) => cmd_verify(args),
        Some(Command::Tree(args)) => cmd_tree(args),
        Some(Command::Init(args)) => cmd_init(args),
        None => {
            // Backward compatibility: treat a bare path as verify.
            let args = VerifyArgs {
                path: cli.path,
                ..Default::default()
            };
            cmd_verify(args)
        }
    };

    std::process::exit(exit_code);
}
