#[cfg(test)]
mod tests {
    use bindle_core::{
        BindKey, Binds, ConnectOptions, Connection, Driver, Execution, MemoryCursor, Prepared,
        Result, Row, RowsAffected, Schema, StatementError, Value, ValueCategory, binds,
        named_binds,
    };
    use std::{
        sync::{
            Arc, Barrier,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };
    use uuid::Uuid;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[derive(Default)]
    struct Counters {
        active: AtomicUsize,
        max_active: AtomicUsize,
        executions: AtomicUsize,
        finished: AtomicUsize,
    }

    struct EchoDriver {
        counters: Arc<Counters>,
        barrier: Option<Arc<Barrier>>,
    }

    impl EchoDriver {
        fn new() -> Self {
            Self {
                counters: Default::default(),
                barrier: None,
            }
        }
    }

    struct EchoConnection {
        counters: Arc<Counters>,
        barrier: Option<Arc<Barrier>>,
    }

    struct EchoPrepared {
        query: String,
        counters: Arc<Counters>,
        barrier: Option<Arc<Barrier>>,
    }

    impl Driver for EchoDriver {
        type Connection = EchoConnection;
        const NAME: &'static str = "echo";

        fn connect(&self, _options: &ConnectOptions) -> Result<EchoConnection> {
            Ok(EchoConnection {
                counters: self.counters.clone(),
                barrier: self.barrier.clone(),
            })
        }
    }

    impl Connection for EchoConnection {
        type Prepared = EchoPrepared;

        fn new_prepared(&self, query: &str) -> EchoPrepared {
            if let (Some(barrier), "slow") = (&self.barrier, query) {
                barrier.wait();
                barrier.wait();
            }
            EchoPrepared {
                query: query.into(),
                counters: self.counters.clone(),
                barrier: self.barrier.clone(),
            }
        }

        fn ping(&self) -> Result<u64> {
            Ok(1)
        }
    }

    impl Prepared for EchoPrepared {
        fn input_type_map(map: &mut bindle_core::TypeMap) {
            map.register(ValueCategory::Uuid, |value| match value {
                Value::Uuid(Some(id)) => Ok(Value::Varchar(Some(id.to_string()))),
                v => Ok(v),
            });
        }

        fn new_execution(&mut self, binds: &Binds) -> Result<Execution> {
            let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_active.fetch_max(active, Ordering::SeqCst);
            match (&self.barrier, self.query.as_str()) {
                (Some(barrier), "wait") => {
                    barrier.wait();
                }
                _ => thread::sleep(Duration::from_millis(5)),
            }
            self.counters.executions.fetch_add(1, Ordering::SeqCst);
            self.counters.active.fetch_sub(1, Ordering::SeqCst);
            let row: Row = binds.iter().map(|(_, v)| v.clone()).collect();
            Ok(Execution::new(MemoryCursor::new([row]), Schema::default()))
        }

        fn new_modification(&mut self, binds: &Binds) -> Result<RowsAffected> {
            Ok(RowsAffected::new(binds.len() as u64))
        }

        fn finish(&mut self) -> Result<()> {
            self.counters.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct BareDriver;
    struct BareConnection;
    struct BarePrepared;

    impl Driver for BareDriver {
        type Connection = BareConnection;
        const NAME: &'static str = "bare";

        fn connect(&self, _options: &ConnectOptions) -> Result<BareConnection> {
            Ok(BareConnection)
        }
    }

    impl Connection for BareConnection {
        type Prepared = BarePrepared;

        fn new_prepared(&self, _query: &str) -> BarePrepared {
            BarePrepared
        }
    }

    impl Prepared for BarePrepared {}

    #[test]
    fn execute_echoes_converted_binds() {
        init_logs();
        let session = EchoDriver::new().get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT ?").unwrap();
        let id = Uuid::from_u128(0x67e5504410b1426f9247bb680e5fe0c8);
        let result = statement.execute(binds![5, id]).unwrap();
        assert_eq!(
            result.binds(),
            &Binds::Positional(vec![
                Value::Int32(Some(5)),
                Value::Varchar(Some("67e55044-10b1-426f-9247-bb680e5fe0c8".into())),
            ])
        );
        let rows = result.fetch_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<i32>("0").unwrap(), 5);
        assert_eq!(rows[0].names(), ["0", "1"]);
        assert_eq!(result.statement_id(), statement.id());
        let last = statement.last_result().expect("Missing last result");
        assert!(Arc::ptr_eq(&last, &result));
        assert!(Arc::ptr_eq(&result.statement().unwrap(), &statement));
        statement.finish();
    }

    #[test]
    fn named_binds_keep_their_keys() {
        let session = EchoDriver::new().get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT :a, :b").unwrap();
        let result = statement
            .execute(named_binds! { "b" => 2.5f64, "a" => "text" })
            .unwrap();
        assert_eq!(
            result.binds().get_named("a"),
            Some(&Value::Varchar(Some("text".into())))
        );
        assert_eq!(result.binds().get_named("b"), Some(&Value::Float64(Some(2.5))));
        let affected = statement.execute_modification(named_binds! { "a" => 1 }).unwrap();
        assert_eq!(affected.rows_affected, 1);
    }

    #[test]
    fn finish_is_terminal_and_idempotent() {
        let driver = EchoDriver::new();
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT 1").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let calls = calls.clone();
            statement.set_finalizer(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(session.open_statements().contains(statement.id()));
        statement.finish();
        statement.finish();
        assert!(statement.is_finished());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(counters.finished.load(Ordering::SeqCst), 1);
        assert!(!session.open_statements().contains(statement.id()));

        let error = statement.execute(binds![5]).unwrap_err();
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::LifecycleViolation { statement: id, .. }) if *id == statement.id()
        ));
        let error = statement.execute_modification(()).unwrap_err();
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::LifecycleViolation { .. })
        ));
        assert_eq!(counters.executions.load(Ordering::SeqCst), 0);

        let late = Arc::new(AtomicUsize::new(0));
        {
            let late = late.clone();
            statement.set_finalizer(move || {
                late.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn finalizer_replaced_before_finish() {
        let session = EchoDriver::new().get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT 1").unwrap();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        {
            let first = first.clone();
            statement.set_finalizer(move || {
                first.fetch_add(1, Ordering::SeqCst);
            });
            let second = second.clone();
            statement.set_finalizer(move || {
                second.fetch_add(1, Ordering::SeqCst);
            });
        }
        statement.finish();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unimplemented_driver_operations() {
        let session = BareDriver.get_handle("bare://").unwrap();
        let statement = session.prepare("SELECT 1").unwrap();
        let error = statement.execute(binds![5]).unwrap_err();
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::UnimplementedDriverOperation {
                operation: "new_execution",
                ..
            })
        ));
        let error = statement.execute_modification(()).unwrap_err();
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::UnimplementedDriverOperation {
                operation: "new_modification",
                ..
            })
        ));
        let error = session.ping().unwrap_err();
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::UnimplementedDriverOperation {
                operation: "ping",
                ..
            })
        ));
        assert!(!statement.is_finished());
    }

    #[test]
    fn conversion_failure_keeps_statement_live() {
        let driver = EchoDriver::new();
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT ?, ?").unwrap();
        let error = statement.execute(binds![1, f64::NAN]).unwrap_err();
        match StatementError::of(&error) {
            Some(StatementError::ConversionFailure { parameter, .. }) => {
                assert_eq!(*parameter, BindKey::Index(1))
            }
            _ => panic!("Expected a conversion failure"),
        }
        let error = statement
            .execute(named_binds! { "text" => "a\0b" })
            .unwrap_err();
        match StatementError::of(&error) {
            Some(StatementError::ConversionFailure { parameter, .. }) => {
                assert_eq!(*parameter, BindKey::Name("text".into()))
            }
            _ => panic!("Expected a conversion failure"),
        }
        assert_eq!(counters.executions.load(Ordering::SeqCst), 0);
        assert!(!statement.is_finished());
        assert!(statement.execute(binds![1, 2.0]).is_ok());
    }

    #[test]
    fn same_statement_is_serialized() {
        let driver = EchoDriver::new();
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT ?").unwrap();
        thread::scope(|s| {
            for i in 0..8 {
                let statement = &statement;
                s.spawn(move || {
                    statement.execute(binds![i]).unwrap();
                });
            }
        });
        assert_eq!(counters.executions.load(Ordering::SeqCst), 8);
        assert_eq!(counters.max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_statements_run_in_parallel() {
        let driver = EchoDriver {
            counters: Default::default(),
            barrier: Some(Arc::new(Barrier::new(2))),
        };
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        let first = session.prepare("wait").unwrap();
        let second = session.prepare("wait").unwrap();
        thread::scope(|s| {
            s.spawn(|| first.execute(()).unwrap());
            s.spawn(|| second.execute(()).unwrap());
        });
        assert_eq!(counters.max_active.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn finish_waits_for_execution_in_flight() {
        let driver = EchoDriver::new();
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT ?").unwrap();
        thread::scope(|s| {
            s.spawn(|| {
                for i in 0..20 {
                    if statement.execute(binds![i]).is_err() {
                        break;
                    }
                }
            });
            thread::sleep(Duration::from_millis(12));
            statement.finish();
        });
        assert_eq!(counters.finished.load(Ordering::SeqCst), 1);
        assert_eq!(counters.active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drop_finishes_statement() {
        let driver = EchoDriver::new();
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT 1").unwrap();
        let id = statement.id();
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let calls = calls.clone();
            statement.set_finalizer(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(session.open_statements().len(), 1);
        drop(statement);
        assert!(!session.open_statements().contains(id));
        assert!(session.open_statements().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(counters.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rewindable_result_propagation() {
        let session = EchoDriver::new()
            .get_handle("echo://?rewindable_result=true")
            .unwrap();
        assert!(session.rewindable_result());
        let statement = session.prepare("SELECT ?").unwrap();
        assert!(statement.rewindable_result());
        let result = statement.execute(binds![1]).unwrap();
        assert!(result.rewindable_result());
        assert_eq!(result.fetch_all().unwrap().len(), 1);
        result.rewind().unwrap();
        assert_eq!(result.fetch_all().unwrap().len(), 1);

        statement.set_rewindable_result(false);
        let result = statement.execute(binds![1]).unwrap();
        assert!(!result.rewindable_result());
        assert!(result.rewind().is_err());

        session.set_rewindable_result(false);
        let other = session.prepare("SELECT 2").unwrap();
        assert!(!other.rewindable_result());
    }

    #[test]
    fn rewindable_override_is_scoped_to_thread() {
        let session = EchoDriver::new().get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT ?").unwrap();
        {
            let _guard = statement.override_rewindable_result(true);
            assert!(statement.rewindable_result());
            thread::scope(|s| {
                s.spawn(|| assert!(!statement.rewindable_result()));
            });
            {
                let _inner = statement.override_rewindable_result(false);
                assert!(!statement.rewindable_result());
            }
            assert!(statement.rewindable_result());
            let result = statement.execute(binds![1]).unwrap();
            assert!(result.rewindable_result());
        }
        assert!(!statement.rewindable_result());
    }

    #[test]
    fn session_execute_and_disconnect() {
        let driver = EchoDriver::new();
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        assert_eq!(session.ping().unwrap(), 1);

        let result = session.execute("SELECT ?", binds![7]).unwrap();
        assert_eq!(result.fetch_all().unwrap()[0].values(), [Value::Int32(Some(7))]);
        assert!(result.statement().is_none());
        assert!(session.open_statements().is_empty());
        assert_eq!(session.last_query().as_deref(), Some("SELECT ?"));
        let affected = session
            .execute_modification("UPDATE t SET a = ?", binds![1, 2])
            .unwrap();
        assert_eq!(affected.rows_affected, 2);

        let first = session.prepare("SELECT 1").unwrap();
        let second = session.prepare("SELECT 2").unwrap();
        assert_eq!(session.open_statements().ids(), [first.id(), second.id()]);
        session.disconnect().unwrap();
        session.disconnect().unwrap();
        assert!(!session.is_connected());
        assert!(first.is_finished());
        assert!(second.is_finished());
        assert!(session.open_statements().is_empty());
        assert_eq!(counters.finished.load(Ordering::SeqCst), 4);

        let error = session.prepare("SELECT 3").unwrap_err();
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::Disconnected)
        ));
        assert!(session.ping().is_err());
    }

    #[test]
    fn prepare_racing_disconnect() {
        let barrier = Arc::new(Barrier::new(2));
        let driver = EchoDriver {
            counters: Default::default(),
            barrier: Some(barrier.clone()),
        };
        let counters = driver.counters.clone();
        let session = driver.get_handle("echo://").unwrap();
        let prepared = thread::scope(|s| {
            let handle = s.spawn(|| session.prepare("slow"));
            barrier.wait();
            session.disconnect().unwrap();
            barrier.wait();
            handle.join().unwrap()
        });
        let error = prepared.unwrap_err();
        assert!(matches!(
            StatementError::of(&error),
            Some(StatementError::Disconnected)
        ));
        assert!(session.open_statements().is_empty());
        assert_eq!(counters.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn statement_outlives_session() {
        let session = EchoDriver::new().get_handle("echo://").unwrap();
        let statement = session.prepare("SELECT 1").unwrap();
        drop(session);
        assert!(statement.session().is_none());
        assert!(statement.is_finished());
    }

    #[test]
    fn type_map_is_shared_per_driver() {
        let session = EchoDriver::new().get_handle("echo://").unwrap();
        let first = session.prepare("SELECT 1").unwrap();
        let second = session.prepare("SELECT 2").unwrap();
        assert!(Arc::ptr_eq(first.input_type_map(), second.input_type_map()));
        assert!(first.input_type_map().contains(ValueCategory::Uuid));
        let bare = BareDriver.get_handle("bare://").unwrap();
        let other = bare.prepare("SELECT 1").unwrap();
        assert!(!other.input_type_map().contains(ValueCategory::Uuid));
        assert!(other.input_type_map().contains(ValueCategory::Numeric));
    }

    #[test]
    fn wrong_scheme() {
        assert!(EchoDriver::new().get_handle("bare://").is_err());
    }
}
