// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use assert_cmd::Command;
use predicates::prelude::*;

fn dotpipe() -> Command {
    let mut cmd = Command::cargo_bin("dotpipe").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("DOTPIPE_CONFIG");
    cmd
}

#[test]
fn test_run_prints_items() {
    dotpipe()
        .args(["run", "--step", "filter_none", "--step", "take 2"])
        .write_stdin("[1, 2, 3]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown stage 'filter_none'"));

    dotpipe()
        .args(["run", "-s", "reverse", "-s", "take 2"])
        .write_stdin("[1, 2, 3]")
        .assert()
        .success()
        .stdout("[3,2]\n");
}

#[test]
fn test_run_with_sink() {
    dotpipe()
        .args(["run", "--sink", "mean"])
        .write_stdin("[1, 2, 3, 5, 8]")
        .assert()
        .success()
        .stdout("3.8\n");

    dotpipe()
        .args(["run", "--step", "depeat", "--sink", "str \"\""])
        .write_stdin("\"abbcccacbba\"")
        .assert()
        .success()
        .stdout("\"abcacba\"\n");
}

#[test]
fn test_run_reads_input_file_and_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let config = dir.path().join("dotpipe.toml");
    std::fs::write(&input, "[5, 4, 3, 2, 1]").unwrap();
    std::fs::write(&config, "[pipe]\nmax_materialize = 3\n").unwrap();

    dotpipe()
        .arg("run")
        .arg("--input")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .args(["--step", "take 5", "--step", "sort"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("materializing more than 3 items"));

    dotpipe()
        .arg("run")
        .arg("--input")
        .arg(&input)
        .args(["--step", "take 5", "--step", "sort", "--max-materialize", "5"])
        .assert()
        .success()
        .stdout("[1,2,3,4,5]\n");
}

#[test]
fn test_seeded_runs_repeat() {
    let run = || {
        dotpipe()
            .args(["run", "--rng", "seeded:11", "--sink", "shuffle"])
            .write_stdin("[1, 2, 3, 4, 5, 6, 7, 8]")
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_bad_rng_mode_is_rejected() {
    dotpipe()
        .args(["run", "--rng", "dice"])
        .write_stdin("[]")
        .assert()
        .failure();
}

#[test]
fn test_stages_lists_registry() {
    dotpipe()
        .arg("stages")
        .assert()
        .success()
        .stdout(predicate::str::contains("Steps:").and(predicate::str::contains("chunk <n> [step] [fill]")));
}
