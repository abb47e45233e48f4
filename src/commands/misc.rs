use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

pub fn generate_completions(shell: Shell) {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "repobrowser", &mut io::stdout());

    eprintln!();
    eprintln!("Save the output to the appropriate location for your shell:");
    match shell {
        Shell::Bash => {
            eprintln!("  repobrowser completions bash > ~/.local/share/bash-completion/completions/repobrowser");
        }
        Shell::Zsh => {
            eprintln!("  repobrowser completions zsh > ~/.zsh/completions/_repobrowser");
            eprintln!("  # (Add 'fpath=(~/.zsh/completions $fpath)' before 'compinit' in .zshrc)");
        }
        Shell::Fish => {
            eprintln!("  repobrowser completions fish > ~/.config/fish/completions/repobrowser.fish");
        }
        _ => {}
    }
}
