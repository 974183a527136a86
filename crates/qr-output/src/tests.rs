//! Integration tests for qr-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::CsvWriter;
    use crate::row::{DeliveryRow, SeriesRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(path: &std::path::Path) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("series.csv").exists());
        assert!(dir.path().join("deliveries.csv").exists());
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tmp();
        let nested = dir.path().join("runs").join("a");
        let _w = CsvWriter::new(&nested).unwrap();
        assert!(nested.join("series.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        assert_eq!(headers(&dir.path().join("series.csv")), ["label", "tick", "avg_delivery_time"]);
        assert_eq!(
            headers(&dir.path().join("deliveries.csv")),
            ["packet_id", "origin", "destination", "sent", "received", "hops"]
        );
    }

    #[test]
    fn series_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_series(&[
            SeriesRow { label: "low".into(), tick: 10, avg_delivery_time: 3.5 },
            SeriesRow { label: "low".into(), tick: 20, avg_delivery_time: 4.0 },
        ])
        .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("series.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "low");
        assert_eq!(&rows[0][1], "10");
        assert_eq!(&rows[0][2], "3.5");
        assert_eq!(&rows[1][2], "4");
    }

    #[test]
    fn delivery_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_deliveries(&[DeliveryRow {
            packet_id:   7,
            origin:      0,
            destination: 35,
            sent:        12,
            received:    22,
            hops:        10,
        }])
        .unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("deliveries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "7");
        assert_eq!(&rows[0][2], "35");
        assert_eq!(&rows[0][5], "10");
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

#[cfg(test)]
mod export_tests {
    use qr_core::{NodeId, RoutingConfig, ScenarioConfig};
    use qr_net::{RequestGenerator, Topology};
    use qr_sim::{Sim, SimBuilder};
    use tempfile::TempDir;

    use crate::{CsvWriter, DeliveryLogObserver, OutputWriter, export_deliveries, export_series};

    fn run_line(dir: &TempDir) -> (Sim, DeliveryLogObserver<CsvWriter>) {
        let topology = Topology::grid(1, 3, RoutingConfig::default()).unwrap();
        let mut sim = SimBuilder::new(topology)
            .scenario(ScenarioConfig { sample_every: 1, max_idle_ticks: 1_000 })
            .build()
            .unwrap();
        let requests = RequestGenerator::new(NodeId(0), NodeId(2)).unwrap();
        let mut log = DeliveryLogObserver::new(CsvWriter::new(dir.path()).unwrap());
        sim.run_gradual_load(&requests, 3, 1, "line", &mut log).unwrap();
        (sim, log)
    }

    #[test]
    fn observer_streams_one_row_per_delivery() {
        let dir = tempfile::tempdir().unwrap();
        let (sim, mut log) = run_line(&dir);
        assert!(log.take_error().is_none());
        assert_eq!(log.written(), 3);
        assert_eq!(sim.metrics().delivered_count(), 3);

        let mut writer = log.into_writer();
        writer.finish().unwrap();
        let mut rdr = csv::Reader::from_path(dir.path().join("deliveries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| &r[1] == "0" && &r[2] == "2"));
    }

    #[test]
    fn series_export_matches_collector() {
        let dir = tempfile::tempdir().unwrap();
        let (sim, log) = run_line(&dir);
        let mut writer = log.into_writer();
        let written = export_series(sim.metrics(), &mut writer).unwrap();
        writer.finish().unwrap();

        let expected = sim.metrics().series_for("line").unwrap().samples.len();
        assert_eq!(written, expected);
        let mut rdr = csv::Reader::from_path(dir.path().join("series.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), expected);
        assert!(rows.iter().all(|r| &r[0] == "line"));
    }

    #[test]
    fn bulk_delivery_export() {
        let dir = tempfile::tempdir().unwrap();
        let (sim, _log) = run_line(&dir);
        let other = tempfile::tempdir().unwrap();
        let mut writer = CsvWriter::new(other.path()).unwrap();
        assert_eq!(export_deliveries(sim.metrics(), &mut writer).unwrap(), 3);
        writer.finish().unwrap();
    }
}
