use std::io::{self, Write};

use crate::{
    logging::{RunLogEvent, RunLogEventKind, RunLogWriter},
    simulator::{SimulationReport, TraceEntry},
};

pub const TRACE_CSV_HEADER: &str = "index,time,divergence,action,price,shares,cash,holdings\n";

pub struct TraceCsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> TraceCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(TRACE_CSV_HEADER.as_bytes())
    }

    pub fn append_trace_rows(&mut self, rows: &[TraceEntry]) -> io::Result<()> {
        for row in rows {
            let divergence = format!(
                "{}:{}->{}",
                row.divergence.kind.as_str(),
                row.divergence.prefix_index,
                row.divergence.suffix_index
            );
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{}",
                row.index,
                escape_csv_field(&row.time),
                divergence,
                row.action.as_str(),
                row.price,
                row.shares,
                row.cash_after,
                row.shares_after
            )?;
        }
        Ok(())
    }

    /// Writes the whole report, flushes, and only then records the artifact
    /// in the run log.
    pub fn write_report_and_log(
        &mut self,
        report: &SimulationReport,
        run_log_writer: &mut dyn RunLogWriter,
    ) -> io::Result<()> {
        self.write_header()?;
        self.append_trace_rows(&report.trace)?;
        self.writer.flush()?;
        run_log_writer.write(RunLogEvent::new(
            report.trace.len(),
            "",
            RunLogEventKind::TraceWritten,
        ));
        Ok(())
    }
}

fn escape_csv_field(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, io, rc::Rc};

    use strategy::{DivergenceEvent, DivergenceKind};

    use crate::{
        logging::{InMemoryRunLogWriter, RunLogEvent, RunLogEventKind, RunLogWriter},
        simulator::{SimulationReport, TradeAction, TraceEntry},
    };

    use super::{TraceCsvWriter, TRACE_CSV_HEADER};

    struct TrackingWriter {
        bytes: Vec<u8>,
        flush_called: Rc<Cell<bool>>,
        flush_fails: bool,
    }

    impl TrackingWriter {
        fn new(flush_called: Rc<Cell<bool>>, flush_fails: bool) -> Self {
            Self {
                bytes: Vec::new(),
                flush_called,
                flush_fails,
            }
        }
    }

    impl io::Write for TrackingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flush_called.set(true);
            if self.flush_fails {
                return Err(io::Error::other("flush failed"));
            }
            Ok(())
        }
    }

    struct FlushAssertingLogWriter {
        flush_called: Rc<Cell<bool>>,
    }

    impl RunLogWriter for FlushAssertingLogWriter {
        fn write(&mut self, _event: RunLogEvent) {
            assert!(
                self.flush_called.get(),
                "expected writer flush before logging"
            );
        }
    }

    fn sample_report() -> SimulationReport {
        SimulationReport {
            starting_cash: 50_000.0,
            final_cash: 60_000.0,
            final_shares: 0,
            final_valuation: 60_000.0,
            trace: vec![
                TraceEntry {
                    index: 5,
                    time: "2025-12-04 09:20:00".to_string(),
                    divergence: DivergenceEvent::new(0, 5, DivergenceKind::Bullish),
                    action: TradeAction::Buy,
                    price: 100.0,
                    shares: 500,
                    cash_after: 0.0,
                    shares_after: 500,
                },
                TraceEntry {
                    index: 30,
                    time: "Dec 4, 10:15".to_string(),
                    divergence: DivergenceEvent::new(15, 30, DivergenceKind::Bearish),
                    action: TradeAction::Sell,
                    price: 120.0,
                    shares: 500,
                    cash_after: 60_000.0,
                    shares_after: 0,
                },
            ],
        }
    }

    #[test]
    fn write_report_and_log_flushes_before_emitting_log() {
        let flush_called = Rc::new(Cell::new(false));
        let writer = TrackingWriter::new(Rc::clone(&flush_called), false);
        let mut trace_writer = TraceCsvWriter::new(writer);
        let mut log_writer = FlushAssertingLogWriter { flush_called };

        trace_writer
            .write_report_and_log(&sample_report(), &mut log_writer)
            .expect("report write should flush and log");
    }

    #[test]
    fn write_report_and_log_propagates_flush_errors() {
        let flush_called = Rc::new(Cell::new(false));
        let writer = TrackingWriter::new(Rc::clone(&flush_called), true);
        let mut trace_writer = TraceCsvWriter::new(writer);
        let mut log_writer = InMemoryRunLogWriter::new();

        let err = trace_writer
            .write_report_and_log(&sample_report(), &mut log_writer)
            .expect_err("flush failure should be returned");

        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(log_writer.events().is_empty());
    }

    #[test]
    fn writes_one_row_per_trade_and_escapes_time() {
        let mut output = Vec::new();
        let mut log_writer = InMemoryRunLogWriter::new();

        TraceCsvWriter::new(&mut output)
            .write_report_and_log(&sample_report(), &mut log_writer)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!(
                "{TRACE_CSV_HEADER}5,2025-12-04 09:20:00,bullish:0->5,buy,100,500,0,500\n\
                 30,\"Dec 4, 10:15\",bearish:15->30,sell,120,500,60000,0\n"
            )
        );
        assert_eq!(log_writer.kinds(), vec![RunLogEventKind::TraceWritten]);
        assert_eq!(log_writer.events()[0].index, 2);
    }
}
