use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fhe_ckks::ckks::{
    Ciphertext, CkksParametersBuilder, Encoding, Plaintext, PublicKey, RelinearizationKey,
    SecretKey,
};
use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
use rand::thread_rng;
use std::time::Duration;

pub fn ckks_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ckks");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(600));
    group.measurement_time(Duration::from_millis(1000));

    let mut rng = thread_rng();
    for (degree, moduli_sizes) in [
        (4096usize, vec![36usize, 36, 37]),
        (8192, vec![43, 43, 44, 44, 44]),
    ] {
        let par = CkksParametersBuilder::new()
            .set_degree(degree)
            .set_moduli_sizes(&moduli_sizes)
            .build_arc()
            .unwrap();
        let q = par.moduli_sizes().iter().sum::<usize>();
        let name = format!("n={degree}/log(q)={q}");
        let encoding = Encoding::with_scale(2f64.powi(30));

        let sk = SecretKey::random(&par, &mut rng).unwrap();
        let pk = PublicKey::new(&sk, &mut rng).unwrap();
        let rk = RelinearizationKey::new(&sk, 4, &mut rng).unwrap();
        let pt = Plaintext::try_encode(1.5, encoding, &par).unwrap();
        let c1: Ciphertext = pk.try_encrypt(&pt, &mut rng).unwrap();
        let c2: Ciphertext = pk.try_encrypt(&pt, &mut rng).unwrap();

        group.bench_function(BenchmarkId::new("keygen_rk", &name), |b| {
            b.iter(|| RelinearizationKey::new(&sk, 4, &mut thread_rng()));
        });

        group.bench_function(BenchmarkId::new("encode", &name), |b| {
            b.iter(|| Plaintext::try_encode(1.5, encoding, &par));
        });

        group.bench_function(BenchmarkId::new("decode", &name), |b| {
            b.iter(|| f64::try_decode(&pt, encoding));
        });

        group.bench_function(BenchmarkId::new("encrypt_pk", &name), |b| {
            b.iter(|| pk.try_encrypt(&pt, &mut thread_rng()));
        });

        group.bench_function(BenchmarkId::new("decrypt", &name), |b| {
            b.iter(|| sk.try_decrypt(&c1));
        });

        group.bench_function(BenchmarkId::new("add_ct", &name), |b| {
            b.iter(|| &c1 + &c2);
        });

        group.bench_function(BenchmarkId::new("mul_relin", &name), |b| {
            b.iter(|| {
                let mut c3 = &c1 * &c2;
                rk.relinearizes(&mut c3)
            });
        });

        group.bench_function(BenchmarkId::new("rescale", &name), |b| {
            b.iter(|| {
                let mut c3 = c1.clone();
                c3.rescale_to_next()
            });
        });
    }

    group.finish();
}

criterion_group!(ckks, ckks_benchmark);
criterion_main!(ckks);
