//! 客户端地址处理性能基准测试

use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::net::IpAddr;

use geoheaders::utils::ip::{ExclusionList, extract_candidate_ip};

// ============== extract_candidate_ip 基准测试 ==============

fn bench_extract_candidate_ip(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/extract_candidate_ip");
    let forwarded = vec![
        HeaderName::from_static("x-real-ip"),
        HeaderName::from_static("x-forwarded-for"),
    ];

    let empty = HeaderMap::new();
    group.bench_function("remote_addr", |b| {
        b.iter(|| {
            assert!(extract_candidate_ip(black_box("188.193.88.199:9999"), &empty, &forwarded).is_ok());
        });
    });

    let mut with_xff = HeaderMap::new();
    with_xff.insert(
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static("188.193.88.199, 10.0.0.1, 10.0.0.2, 10.0.0.3"),
    );
    group.bench_function("forwarded_chain", |b| {
        b.iter(|| {
            assert!(extract_candidate_ip(black_box("10.0.0.3:443"), &with_xff, &forwarded).is_ok());
        });
    });

    group.bench_function("unparseable", |b| {
        b.iter(|| {
            assert!(extract_candidate_ip(black_box("qwerty"), &empty, &forwarded).is_err());
        });
    });

    group.finish();
}

// ============== ExclusionList 基准测试 ==============

fn bench_exclusion_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/exclusion_list");

    for size in [1usize, 16, 256] {
        let entries: Vec<String> = (0..size)
            .map(|i| format!("10.{}.{}.0/24", i / 256, i % 256))
            .collect();
        let (list, _) = ExclusionList::parse(&entries);
        let miss: IpAddr = "188.193.88.199".parse().unwrap();

        group.bench_with_input(BenchmarkId::new("miss", size), &list, |b, list| {
            b.iter(|| {
                assert!(!list.contains(black_box(&miss)));
            });
        });
    }

    let (list, _) = ExclusionList::parse(&["10.0.0.0/8", "192.168.0.0/16", "2001:db8::/32"]);
    group.bench_function("parse_and_match", |b| {
        b.iter(|| {
            assert!(list.is_excluded(black_box("192.168.4.20")));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_extract_candidate_ip, bench_exclusion_list);
criterion_main!(benches);
