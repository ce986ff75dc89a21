//! End-to-end scenarios driving a fresh `Interpreter` directly, in process
//! (no subprocess spawning — the interpreter is a library-shaped struct).

use minibasic::Interpreter;

fn feed(interp: &mut Interpreter, lines: &[&str], out: &mut Vec<u8>) {
    for line in lines {
        interp.parse_line(line, out).expect("line should parse");
    }
}

#[test]
fn hello() {
    let mut interp = Interpreter::new();
    let mut out = Vec::new();
    feed(&mut interp, &["10 print \"hello\""], &mut out);
    interp.run(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
}

#[test]
fn counter() {
    let mut interp = Interpreter::new();
    let mut out = Vec::new();
    feed(
        &mut interp,
        &[
            "10 for i = 1 to 3",
            "20 print i;",
            "30 print \" \";",
            "40 next i",
            "50 print \"\"",
        ],
        &mut out,
    );
    interp.run(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1 2 3 \n");
}

#[test]
fn sum_via_gosub() {
    let mut interp = Interpreter::new();
    let mut out = Vec::new();
    feed(
        &mut interp,
        &[
            "10 let n = 0",
            "20 gosub 100",
            "30 print n",
            "40 end",
            "100 let n = n + 1",
            "110 if n < 5 then goto 100",
            "120 return",
        ],
        &mut out,
    );
    interp.run(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "5\n");
}

#[test]
fn do_loop_until() {
    let mut interp = Interpreter::new();
    let mut out = Vec::new();
    feed(
        &mut interp,
        &[
            "10 let x = 0",
            "20 do",
            "30 let x = x + 1",
            "40 loop until x = 3",
            "50 print x",
        ],
        &mut out,
    );
    interp.run(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "3\n");
}

#[test]
fn truth_encoding() {
    let mut interp = Interpreter::new();
    let mut out = Vec::new();
    interp
        .parse_line("print 1 = 1, \" \", 1 = 2", &mut out)
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "-1 0\n");
}

#[test]
fn stop_and_continue() {
    let mut interp = Interpreter::new();
    let mut out = Vec::new();
    feed(&mut interp, &["10 print 1", "20 stop", "30 print 2"], &mut out);
    interp.run(&mut out).unwrap();
    assert_eq!(String::from_utf8(out.clone()).unwrap(), "1\n");
    assert!(interp.is_stopped());
    interp.continue_run(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1\n2\n");
}

#[test]
fn program_round_trips_through_save_and_load_format() {
    // Mirrors the `N\tTEXT\n` file format without touching the filesystem:
    // build the save text by hand and load it into a fresh interpreter.
    let mut source = Interpreter::new();
    let mut out = Vec::new();
    feed(
        &mut source,
        &["10 let a = 1", "20 print a", "30 end"],
        &mut out,
    );
    let mut saved = String::new();
    for (number, text) in source.program_lines() {
        saved.push_str(&format!("{}\t{}\n", number, text));
    }

    let mut dest = Interpreter::new();
    for line in saved.lines() {
        dest.parse_line(line, &mut out).unwrap();
    }
    assert_eq!(dest.program_lines(), source.program_lines());
}

#[test]
fn goto_missing_line_does_not_panic() {
    let mut interp = Interpreter::new();
    let mut out = Vec::new();
    feed(&mut interp, &["10 goto 999"], &mut out);
    interp.run(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "");
}
