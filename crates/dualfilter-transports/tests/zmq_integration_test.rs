// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for ZMQ PUSH/PULL pairs

use dualfilter_transports::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

/// Test PULL-PUSH pattern
#[test]
fn test_pull_push() {
    let barrier = Arc::new(Barrier::new(2));
    let barrier_server = Arc::clone(&barrier);
    let barrier_client = Arc::clone(&barrier);

    // PULL (receiver) thread
    let pull_handle = thread::spawn(move || {
        let context = Arc::new(zmq::Context::new());
        let config = ServerConfig::new("tcp://127.0.0.1:31002");
        let mut pull = ZmqPull::new(context, config).unwrap();
        pull.start().unwrap();

        // Signal ready
        barrier_server.wait();

        let mut received = Vec::new();
        for _ in 0..3 {
            if let Ok(data) = pull.pull_timeout(2000) {
                received.push(String::from_utf8(data).unwrap());
            }
        }

        assert_eq!(received, vec!["data_0", "data_1", "data_2"]);

        pull.stop().unwrap();
    });

    // PUSH (sender) thread
    let push_handle = thread::spawn(move || {
        let context = Arc::new(zmq::Context::new());
        let config = ClientConfig::new("tcp://127.0.0.1:31002");
        let mut push = ZmqPush::new(context, config).unwrap();
        push.start().unwrap();

        // Wait for PULL to be ready
        barrier_client.wait();
        thread::sleep(Duration::from_millis(100));

        for i in 0..3 {
            let message = format!("data_{}", i);
            push.push(message.as_bytes()).unwrap();
        }

        push.stop().unwrap();
    });

    pull_handle.join().unwrap();
    push_handle.join().unwrap();
}

/// Frames sent before the PULL side binds are delivered once it does
#[test]
fn test_push_before_bind_is_delivered() {
    let context = Arc::new(zmq::Context::new());

    let mut push = ZmqPush::new(
        Arc::clone(&context),
        ClientConfig::new("tcp://127.0.0.1:31004"),
    )
    .unwrap();
    push.start().unwrap();
    push.push(&[1, 0, 0, 0]).unwrap();
    push.push(&[0xFF]).unwrap();

    let mut pull = ZmqPull::new(context, ServerConfig::new("tcp://127.0.0.1:31004")).unwrap();
    pull.start().unwrap();

    assert_eq!(pull.pull_timeout(2000).unwrap(), vec![1, 0, 0, 0]);
    assert_eq!(pull.pull_timeout(2000).unwrap(), vec![0xFF]);
}

/// A socket closed right after its last send still delivers it (linger)
#[test]
fn test_linger_flushes_last_frame() {
    let context = Arc::new(zmq::Context::new());

    let mut pull = ZmqPull::new(
        Arc::clone(&context),
        ServerConfig::new("tcp://127.0.0.1:31005"),
    )
    .unwrap();
    pull.start().unwrap();

    let sender_context = Arc::clone(&context);
    thread::spawn(move || {
        let mut push =
            ZmqPush::new(sender_context, ClientConfig::new("tcp://127.0.0.1:31005")).unwrap();
        push.start().unwrap();
        push.push(&[0xFF]).unwrap();
        push.stop().unwrap();
    })
    .join()
    .unwrap();

    assert_eq!(pull.pull_timeout(2000).unwrap(), vec![0xFF]);
}

/// Test error handling - timeout
#[test]
fn test_timeout() {
    let mut server = ZmqPull::with_address("tcp://127.0.0.1:31003").unwrap();
    server.start().unwrap();

    let result = server.pull_timeout(100);
    assert!(matches!(result, Err(TransportError::Timeout)));

    server.stop().unwrap();
}

/// Oversized frames are rejected before they reach the socket
#[test]
fn test_message_too_large() {
    let config = ClientConfig {
        base: TransportConfig::new("tcp://127.0.0.1:31006").with_max_message_size(8),
        ..Default::default()
    };
    let mut push = ZmqPush::new(Arc::new(zmq::Context::new()), config).unwrap();
    push.start().unwrap();

    let result = push.push(&[0u8; 12]);
    assert!(matches!(
        result,
        Err(TransportError::MessageTooLarge { size: 12, max_size: 8 })
    ));
}

/// Test invalid config
#[test]
fn test_invalid_config() {
    let context = Arc::new(zmq::Context::new());
    let config = ServerConfig::new("");
    assert!(ZmqPull::new(context, config).is_err());
}
