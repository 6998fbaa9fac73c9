// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn pkg_arg() -> Arg {
    Arg::new("pkg").required(true).help("Package name")
}

fn at_arg() -> Arg {
    Arg::new("at")
        .long("at")
        .value_name("VERSION")
        .help("Release version (default: latest)")
}

fn build_cli() -> Command {
    Command::new("release-line")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Release Line Contributors")
        .about("Track package release lines and their dependents")
        .subcommand_required(false)
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("PATH")
                .env("RELEASE_LINE_DB")
                .default_value("/var/lib/release-line/release-line.db")
                .global(true)
                .help("Database path"),
        )
        .subcommand(Command::new("init").about("Initialize the release-line database"))
        .subcommand(
            Command::new("create")
                .about("Create a release, moving the package head to it")
                .arg(pkg_arg())
                .arg(Arg::new("version").required(true).help("Version being released"))
                .arg(
                    Arg::new("previous")
                        .short('p')
                        .long("previous")
                        .help("Previous version (default: the current head)"),
                )
                .arg(
                    Arg::new("dependent")
                        .long("dependent")
                        .value_name("NAME@VERSION")
                        .action(ArgAction::Append)
                        .help("Dependent built against this release (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("get")
                .about("Show a release with its dependents")
                .arg(pkg_arg())
                .arg(at_arg()),
        )
        .subcommand(
            Command::new("head")
                .about("Show the head of a package")
                .arg(pkg_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a release and its dependents (the head is left untouched)")
                .arg(pkg_arg())
                .arg(at_arg()),
        )
        .subcommand(
            Command::new("history")
                .about("Walk a release line backwards from a version")
                .arg(pkg_arg())
                .arg(at_arg()),
        )
        .subcommand(
            Command::new("versions")
                .about("List every recorded version of a package")
                .arg(pkg_arg()),
        )
        .subcommand(Command::new("packages").about("List the heads of all packages"))
        .subcommand(
            Command::new("dependent")
                .about("Manage the dependents of a release")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Record a dependent against a release")
                        .arg(pkg_arg())
                        .arg(Arg::new("dependent").required(true).help("Dependent package name"))
                        .arg(
                            Arg::new("dependent_version")
                                .required(true)
                                .help("Dependent package version"),
                        )
                        .arg(at_arg()),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Remove one dependent, or all dependents, of a release")
                        .arg(pkg_arg())
                        .arg(
                            Arg::new("dependent")
                                .help("Dependent package name (removes all if omitted)"),
                        )
                        .arg(at_arg()),
                )
                .subcommand(
                    Command::new("list")
                        .about("List the dependents of a release")
                        .arg(pkg_arg())
                        .arg(at_arg()),
                )
                .subcommand(
                    Command::new("get")
                        .about("Show one dependent of a release")
                        .arg(pkg_arg())
                        .arg(Arg::new("dependent").required(true).help("Dependent package name"))
                        .arg(at_arg()),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)
        .expect("Failed to render man page");

    let man_path = man_dir.join("release-line.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
