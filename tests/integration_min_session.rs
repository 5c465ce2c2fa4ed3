// Drives the compiled binary through a PTY to exercise the real event loop.
//
// Requires a TTY; expectrl allocates a pseudo terminal. Unix-only and ignored
// by default. Run with: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("tapstat");
    let cmd = format!("{} -p hi --no-save", bin.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("hi")?;
    std::thread::sleep(Duration::from_millis(200));

    // results screen: q quits
    p.send("q")?;
    p.expect(Eof)?;
    Ok(())
}

#[test]
#[ignore]
fn escape_quits_mid_session() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("tapstat");
    let cmd = format!("{} -p hello --no-save", bin.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("he")?;
    p.send("\x1b")?;
    p.expect(Eof)?;
    Ok(())
}
