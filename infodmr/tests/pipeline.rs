use infodmr::prelude::*;
use infodmr::utils::expit;
use itertools::Itertools;
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use rand_distr::{
    Distribution,
    Normal,
};
use rstest::{
    fixture,
    rstest,
};

const STEP: PosType = 100;
const CHROM_LEN: PosType = 200_000;
const BLOCK: (PosType, PosType) = (100_000, 110_000);

struct DemoTrackBuilder {
    chr:       &'static str,
    seed:      u64,
    block:     Option<(PosType, PosType)>,
    use_logit: bool,
}

impl DemoTrackBuilder {
    fn new(seed: u64) -> Self {
        Self {
            chr: "chr1",
            seed,
            block: None,
            use_logit: false,
        }
    }

    fn with_block(
        mut self,
        block: (PosType, PosType),
    ) -> Self {
        self.block = Some(block);
        self
    }

    fn with_logit(mut self) -> Self {
        self.use_logit = true;
        self
    }

    fn with_chr(
        mut self,
        chr: &'static str,
    ) -> Self {
        self.chr = chr;
        self
    }

    /// Background scores are uniform in `[0, upper)`, or logit-normal around
    /// -2 when `use_logit` is set. Block scores are 1.0, or logit-normal
    /// around 2.
    fn build(
        &self,
        upper: f64,
    ) -> IntervalSignal {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let low = Normal::new(-2.0, 0.5).unwrap();
        let high = Normal::new(2.0, 0.5).unwrap();
        (0..CHROM_LEN)
            .step_by(STEP as usize)
            .map(|pos| {
                let in_block = self
                    .block
                    .map(|(start, end)| pos >= start && pos < end)
                    .unwrap_or(false);
                let value = match (in_block, self.use_logit) {
                    (true, true) => expit(high.sample(&mut rng)),
                    (true, false) => 1.0,
                    (false, true) => expit(low.sample(&mut rng)),
                    (false, false) => rng.gen_range(0.0..upper),
                };
                SignalRecord::new(GenomicInterval::new(self.chr, pos, pos + 1), value)
            })
            .collect()
    }
}

#[fixture]
fn config() -> PipelineConfig {
    PipelineConfig::default()
        .with_bandwidth(500.0)
        .with_closing_length(Some(1000))
        .with_emit_intermediates(true)
}

fn overlaps_block(dmr: &DmrRecord) -> bool {
    dmr.interval.start() < BLOCK.1 && dmr.interval.end() > BLOCK.0
}

#[rstest]
fn replicate_null_finds_the_block(config: PipelineConfig) {
    let test = DemoTrackBuilder::new(1).with_block(BLOCK).build(0.2);
    let nulls = (10..13)
        .map(|seed| DemoTrackBuilder::new(seed).build(0.4))
        .collect_vec();

    let output = config.finish().run_with_replicates(&test, &nulls).unwrap();
    assert!(matches!(output.null_model, NullModel::Empirical(_)));
    assert_eq!(output.dmrs.len(), 1);

    let dmr = &output.dmrs[0];
    assert!(overlaps_block(dmr));
    assert!(dmr.interval.start() >= BLOCK.0 - 3_000);
    assert!(dmr.interval.end() <= BLOCK.1 + 3_000);
    assert!(dmr.score > 0.0);

    let smoothed = output.smoothed.unwrap();
    let significance = output.significance.unwrap();
    assert_eq!(smoothed.len(), test.len());
    assert_eq!(significance.len(), smoothed.len());
    assert!(significance
        .values()
        .all(|v| (0.0..=250.0).contains(&v)));
}

#[rstest]
fn mixture_null_ranks_the_block_first(config: PipelineConfig) {
    let test = DemoTrackBuilder::new(2)
        .with_block(BLOCK)
        .with_logit()
        .build(1.0);

    let output = config.finish().run_without_replicates(&test).unwrap();
    let NullModel::Mixture(model) = &output.null_model
    else {
        panic!("expected a mixture null");
    };
    assert!(model.fit().converged);
    assert!(model.mean() < 0.0);

    let best = output
        .dmrs
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .unwrap();
    assert!(overlaps_block(best));
}

#[rstest]
fn shared_null_model_matches_per_sample_runs(config: PipelineConfig) {
    let nulls = (20..23)
        .map(|seed| DemoTrackBuilder::new(seed).build(0.4))
        .collect_vec();
    let pipeline = config.finish();
    let null_model = pipeline.replicate_null_model(&nulls).unwrap();
    assert!(matches!(null_model, NullModel::Empirical(_)));

    for seed in [30, 31] {
        let test = DemoTrackBuilder::new(seed).with_block(BLOCK).build(0.2);
        let shared = pipeline.run_with_null_model(&test, &null_model).unwrap();
        let rebuilt = pipeline.run_with_replicates(&test, &nulls).unwrap();
        assert_eq!(shared.dmrs, rebuilt.dmrs);
    }
    assert!(matches!(
        pipeline.replicate_null_model(&[]),
        Err(DmrError::InputShape(_))
    ));
}

#[rstest]
fn intermediates_are_optional(config: PipelineConfig) {
    let test = DemoTrackBuilder::new(3).with_block(BLOCK).build(0.2);
    let nulls = vec![DemoTrackBuilder::new(4).build(0.4)];
    let output = config
        .with_emit_intermediates(false)
        .finish()
        .run_with_replicates(&test, &nulls)
        .unwrap();
    assert!(output.smoothed.is_none());
    assert!(output.significance.is_none());
    assert!(!output.dmrs.is_empty());
}

#[rstest]
fn empty_null_pool_is_an_input_error(config: PipelineConfig) {
    let test = DemoTrackBuilder::new(5).with_block(BLOCK).build(0.2);
    let pipeline = config.finish();

    let off_target = vec![DemoTrackBuilder::new(6).with_chr("chrUn").build(0.4)];
    assert!(matches!(
        pipeline.run_with_replicates(&test, &off_target),
        Err(DmrError::InputShape(_))
    ));

    let undefined = DemoTrackBuilder::new(7)
        .build(0.4)
        .map_values(|_| f64::NAN);
    assert!(matches!(
        pipeline.run_with_replicates(&test, &[undefined]),
        Err(DmrError::InputShape(_))
    ));
}

#[test]
fn background_only_yields_no_dmrs() {
    let test = DemoTrackBuilder::new(8).build(0.2);
    let nulls = vec![DemoTrackBuilder::new(9).build(0.4)];
    let output = PipelineConfig::default()
        .with_bandwidth(500.0)
        .finish()
        .run_with_replicates(&test, &nulls)
        .unwrap();
    assert!(output.dmrs.is_empty());
}

#[test]
fn merged_region_aggregates_raw_scores() {
    let signal = IntervalSignal::try_from_records(
        [(100, 10.0), (200, 60.0), (300, 65.0), (400, 5.0), (500, 70.0)]
            .into_iter()
            .map(|(pos, value)| SignalRecord::new(GenomicInterval::new("chr1", pos, pos + 1), value)),
    )
    .unwrap();

    let merged = MorphologicalThresholder::new(50.0, 200)
        .threshold(&signal)
        .unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].interval, GenomicInterval::new("chr1", 200, 501));
    assert!((merged[0].score - 200.0 / 150.0).abs() < 1e-12);

    let separate = MorphologicalThresholder::new(50.0, 0)
        .threshold(&signal)
        .unwrap();
    assert_eq!(separate.len(), 3);
}
