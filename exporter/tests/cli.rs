//! End-to-end tests driving the `bitcoind-exporter` binary.

mod common;

use std::process::{Command, Output};

use common::{MockDaemon, closed_port, mainnet_node};

const BIN: &str = env!("CARGO_BIN_EXE_bitcoind-exporter");

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("run exporter")
}

#[test]
fn refused_rpc_connection_exits_before_listening() {
    let rpc_addr = closed_port().to_string();
    let output = run(&[
        "--listen",
        "127.0.0.1:0",
        "--no-rpc-tls",
        "--rpc-addr",
        &rpc_addr,
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unable to create RPC client"), "{stdout}");
    assert!(!stdout.contains("\"listening\""), "{stdout}");
}

#[test]
fn invalid_log_level_exits_with_failure() {
    let output = run(&["--log-level", "loud"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid log level"));
}

#[test]
fn cookie_with_user_pass_is_rejected() {
    let output = run(&["--rpc-cookie", "/tmp/.cookie", "--rpc-pass", "secret"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_exits_successfully() {
    let output = run(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--rpc-cookie"));
}

#[test]
fn occupied_listen_address_exits_with_failure() {
    let daemon = MockDaemon::start(mainnet_node());
    let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("occupy port");
    let listen = taken.local_addr().expect("addr").to_string();
    let rpc_addr = daemon.addr.to_string();

    let output = run(&[
        "--listen",
        &listen,
        "--no-rpc-tls",
        "--rpc-addr",
        &rpc_addr,
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("failed to bind"));
}

#[cfg(unix)]
mod lifecycle {
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Lines};
    use std::net::TcpStream;
    use std::process::{Child, ChildStdout, Command, Stdio};
    use std::thread;
    use std::time::Duration;

    use serde_json::Value;

    use super::BIN;
    use crate::common::{MockDaemon, mainnet_node};

    struct Exporter {
        child: Child,
        lines: Lines<BufReader<ChildStdout>>,
        addr: String,
    }

    impl Exporter {
        /// Spawns the exporter against `daemon` and waits for the
        /// `listening` log line.
        fn spawn(daemon: &MockDaemon) -> Self {
            let rpc_addr = daemon.addr.to_string();
            let mut child = Command::new(BIN)
                .args([
                    "--listen",
                    "127.0.0.1:0",
                    "--no-rpc-tls",
                    "--rpc-addr",
                    &rpc_addr,
                    "--shutdown-timeout",
                    "5s",
                ])
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .spawn()
                .expect("spawn exporter");

            let stdout = child.stdout.take().expect("piped stdout");
            let mut lines = BufReader::new(stdout).lines();

            let addr = loop {
                let line = lines
                    .next()
                    .expect("exporter exited before listening")
                    .expect("read log line");
                let entry: Value = serde_json::from_str(&line).expect("json log line");
                if entry["fields"]["message"] == "listening" {
                    break entry["fields"]["addr"]
                        .as_str()
                        .expect("listen addr field")
                        .to_string();
                }
            };

            Self { child, lines, addr }
        }

        fn interrupt(&self) {
            let killed = Command::new("kill")
                .args(["-INT", &self.child.id().to_string()])
                .status()
                .expect("send SIGINT");
            assert!(killed.success());
        }

        /// Waits for exit and returns the status code with the remaining
        /// log lines.
        fn wait(mut self) -> (Option<i32>, Vec<String>) {
            let status = self.child.wait().expect("wait for exporter");
            let rest = self.lines.map_while(Result::ok).collect();
            (status.code(), rest)
        }
    }

    #[test]
    fn serves_scrapes_then_exits_cleanly_on_interrupt() {
        let daemon = MockDaemon::start(mainnet_node());
        let exporter = Exporter::spawn(&daemon);

        let response = reqwest::blocking::get(format!("http://{}/metrics", exporter.addr))
            .expect("scrape exporter");
        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("text/plain; version=0.0.4; charset=utf-8")
        );
        let body = response.text().expect("read body");
        assert!(body.contains("bitcoind_blockchain_blocks{chain=\"main\"} 800000\n"));
        assert!(body.contains("bitcoind_mempool_size{chain=\"main\"} 4200\n"));
        assert!(body.contains("msg_type=\"inv\"} 1000\n"));
        assert!(body.contains("bitcoind_index_synced{chain=\"main\",index=\"txindex\"} 1\n"));

        exporter.interrupt();
        let (code, rest) = exporter.wait();
        assert_eq!(code, Some(0));
        assert!(
            rest.iter().any(|line| line.contains("Goodbye")),
            "{rest:?}"
        );
    }

    #[test]
    fn interrupt_during_scrape_completes_it_and_refuses_new_connections() {
        let daemon = MockDaemon::start_with_delays(
            mainnet_node(),
            HashMap::from([("getpeerinfo", Duration::from_millis(1500))]),
        );
        let exporter = Exporter::spawn(&daemon);

        let url = format!("http://{}/metrics", exporter.addr);
        let scrape = thread::spawn(move || {
            reqwest::blocking::get(url).and_then(|response| response.text())
        });

        // The scrape is now parked on getpeerinfo.
        thread::sleep(Duration::from_millis(300));
        exporter.interrupt();

        thread::sleep(Duration::from_millis(300));
        assert!(
            TcpStream::connect(&exporter.addr).is_err(),
            "listener still accepting after interrupt"
        );

        let body = scrape
            .join()
            .expect("scrape thread")
            .expect("in-flight scrape completes");
        assert!(body.contains("bitcoind_peer_bytes_sent_per_msg{"), "{body}");
        assert!(body.contains("bitcoind_exporter_scrape_success{collector=\"peers\"} 1\n"));
        assert!(body.contains("bitcoind_blockchain_blocks{chain=\"main\"} 800000\n"));

        let (code, rest) = exporter.wait();
        assert_eq!(code, Some(0));
        assert!(
            rest.iter().any(|line| line.contains("Goodbye")),
            "{rest:?}"
        );
    }
}
