//! Cross-process tests
//!
//! A forked child plays the producer; the parent attaches as a reader.

#[cfg(all(test, feature = "integration"))]
mod integration {
    use nix::sys::mman::shm_unlink;
    use nix::sys::wait::{waitpid, WaitStatus};
    use nix::unistd::{fork, ForkResult};
    use shared_memory::ShmemConf;
    use std::thread;
    use std::time::Duration;

    use shmseries_core::layout::{self, Header, Record};
    use shmseries_core::{Error, SegmentReader};

    fn unique_name() -> String {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("/shmseries_it_{}", ts)
    }

    fn is_exit_success(status: WaitStatus) -> bool {
        matches!(status, WaitStatus::Exited(_, code) if code == 0)
    }

    /// Child: create and fill the segment, leave it behind, exit without unlinking
    fn produce(name: &str, n: i32, limit: i32) -> ! {
        let mut shmem = ShmemConf::new()
            .size(layout::segment_len(limit as usize))
            .os_id(name)
            .create()
            .unwrap();
        shmem.set_owner(false);

        let slice = unsafe { shmem.as_slice_mut() };
        let header = Header {
            n,
            start_ts: 100.0,
            interval: 0.5,
            limit,
        };
        slice[..layout::HEADER_SIZE].copy_from_slice(&layout::encode_header(&header));
        for i in 0..n as usize {
            let record = Record {
                ts: 100.0 + 0.5 * i as f64,
                v: i as i32 + 1,
            };
            let offset = layout::record_offset(i);
            slice[offset..offset + layout::RECORD_SIZE]
                .copy_from_slice(&layout::encode_record(&record));
        }
        std::process::exit(0);
    }

    fn attach_with_retry(name: &str) -> SegmentReader {
        let mut attempts = 0;
        loop {
            match SegmentReader::attach(name) {
                Ok(reader) => break reader,
                Err(Error::SegmentNotFound { .. }) | Err(Error::MalformedLayout(_)) => {
                    attempts += 1;
                    if attempts > 20 {
                        panic!("Failed to attach after {} attempts", attempts);
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => panic!("unexpected attach error: {e}"),
            }
        }
    }

    #[test]
    fn test_cross_process_read() {
        let name = unique_name();

        match unsafe { fork() }.unwrap() {
            ForkResult::Child => produce(&name, 3, 5),
            ForkResult::Parent { child } => {
                let status = waitpid(child, None).unwrap();
                assert!(is_exit_success(status));

                let mut reader = attach_with_retry(&name);
                let records = reader.read_all().unwrap();
                assert_eq!(
                    records,
                    vec![
                        Record { ts: 100.0, v: 1 },
                        Record { ts: 100.5, v: 2 },
                        Record { ts: 101.0, v: 3 },
                    ]
                );
                assert!(matches!(reader.read(3), Err(Error::IndexOutOfRange { .. })));
                reader.detach();
                drop(reader);

                // The reader must not have removed the producer's segment.
                let again = SegmentReader::attach(&name).unwrap();
                assert_eq!(again.read_all().unwrap().len(), 3);
                drop(again);

                shm_unlink(name.as_str()).unwrap();
            }
        }
    }

    #[test]
    fn test_reader_process_exit_keeps_segment() {
        let name = unique_name();

        match unsafe { fork() }.unwrap() {
            ForkResult::Child => produce(&name, 2, 4),
            ForkResult::Parent { child } => {
                assert!(is_exit_success(waitpid(child, None).unwrap()));

                // A reader in another process attaches and exits.
                match unsafe { fork() }.unwrap() {
                    ForkResult::Child => {
                        let ok = match SegmentReader::attach(&name) {
                            Ok(reader) => {
                                matches!(reader.read_all(), Ok(records) if records.len() == 2)
                            }
                            Err(_) => false,
                        };
                        std::process::exit(if ok { 0 } else { 1 });
                    }
                    ForkResult::Parent { child } => {
                        assert!(is_exit_success(waitpid(child, None).unwrap()));
                    }
                }

                let reader = attach_with_retry(&name);
                assert_eq!(reader.read_all().unwrap().len(), 2);
                drop(reader);

                shm_unlink(name.as_str()).unwrap();
            }
        }
    }
}
