use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fhe_handles::{
    BinaryFractionalEncoder, CkksEncoder, Context, EncryptionParameters, Encryptor, Evaluator,
    KeyGenerator, Plaintext,
};
use std::time::Duration;

pub fn evaluator_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluator");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(600));
    group.measurement_time(Duration::from_millis(1000));

    for parameters in [
        EncryptionParameters::bfv_default(),
        EncryptionParameters::ckks_default(),
    ] {
        let context = Context::new(&parameters).unwrap();
        let keygen = KeyGenerator::new(&context).unwrap();
        let relin_keys = keygen.relin_keys(4).unwrap();
        let encryptor = Encryptor::new(&context, &keygen.public_key()).unwrap();
        let evaluator = Evaluator::new(&context);
        let pt: Plaintext = match context.scheme() {
            fhe_handles::SchemeType::Bfv => BinaryFractionalEncoder::new(&parameters)
                .unwrap()
                .encode(1.5)
                .unwrap(),
            fhe_handles::SchemeType::Ckks => CkksEncoder::new(&context)
                .unwrap()
                .encode(1.5, 2f64.powi(40))
                .unwrap(),
        };
        let c1 = encryptor.encrypt(&pt).unwrap();
        let c2 = encryptor.encrypt(&pt).unwrap();

        let name = format!(
            "{}/n={}/log(q)={}",
            parameters.scheme(),
            parameters.poly_modulus_degree(),
            parameters.coeff_modulus().iter().sum::<usize>()
        );

        group.bench_function(BenchmarkId::new("encrypt", &name), |b| {
            b.iter(|| encryptor.encrypt(&pt).unwrap());
        });

        group.bench_function(BenchmarkId::new("add_inplace", &name), |b| {
            let mut c3 = c1.clone();
            b.iter(|| evaluator.add_inplace(&mut c3, &c2).unwrap());
        });

        group.bench_function(BenchmarkId::new("multiply_plain_inplace", &name), |b| {
            b.iter(|| {
                let mut c3 = c1.clone();
                evaluator.multiply_plain_inplace(&mut c3, &pt).unwrap();
            });
        });

        group.bench_function(BenchmarkId::new("multiply_then_relinearize", &name), |b| {
            b.iter(|| {
                let mut c3 = c1.clone();
                evaluator.multiply_inplace(&mut c3, &c2).unwrap();
                evaluator.relinearize_inplace(&mut c3, &relin_keys).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(evaluator, evaluator_benchmark);
criterion_main!(evaluator);
