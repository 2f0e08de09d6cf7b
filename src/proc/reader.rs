use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Drains one process stream line by line into a shared buffer until EOF.
/// A read error becomes a synthetic line instead of propagating, so a
/// broken pipe never takes down the calling flow.
pub fn spawn_reader(
    stream: Box<dyn Read + Send>,
    sink: Arc<Mutex<Vec<String>>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            match line {
                Ok(line) => sink.lock().unwrap().push(line),
                Err(e) => {
                    sink.lock().unwrap().push(format!("[read error] {}", e));
                    break;
                }
            }
        }
    })
}

pub fn join_lines(sink: &Arc<Mutex<Vec<String>>>) -> String {
    sink.lock().unwrap().join("\n")
}
