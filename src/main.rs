use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sparse_mlp::{Example, InputLayer, NetBuilder, SparseModel, TrainConfig, UniformInit};

const NR_CLASS: usize = 3;
const VOCAB: u64 = 50;

// Toy task: the class is the word key modulo 3; the second slot is noise.
fn make_batch(rng: &mut StdRng, len: usize) -> sparse_mlp::Result<Vec<Example>> {
    (0..len)
        .map(|_| {
            let word = rng.gen_range(0..VOCAB);
            let noise = rng.gen_range(0..VOCAB);
            Example::with_gold(vec![word, noise], NR_CLASS, (word % 3) as usize)
        })
        .collect()
}

fn main() -> sparse_mlp::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let input = InputLayer::new(&[(8, vec![0]), (4, vec![1])], UniformInit::with_seed(0))?;
    let net = NetBuilder::new(&[input.length(), 32, NR_CLASS])?
        .eta(0.02)
        .build_with_seed(0)?;
    let mut model = SparseModel::new(input, net, TrainConfig::default())?;

    let mut rng = StdRng::seed_from_u64(0);
    for epoch in 0..20 {
        let mut loss = 0.0;
        for _ in 0..50 {
            loss += model.train_batch(&make_batch(&mut rng, 16)?)?;
        }
        log::info!("epoch {epoch}: loss={:.3}", loss / (50.0 * 16.0));
    }

    let mut correct = 0;
    for word in 0..VOCAB {
        if model.predict_class(&[word, 0])? == (word % 3) as usize {
            correct += 1;
        }
    }
    log::info!(
        "accuracy {correct}/{VOCAB}, {} keys in word table",
        model.input().table(0).map_or(0, |t| t.len())
    );
    Ok(())
}
