use arcstr::ArcStr;

#[derive(Debug, thiserror::Error)]
pub enum MosError {
    #[error("unsupported channel length: {0}")]
    UnsupportedLch(i64),
    #[error("unknown device type: {0}")]
    UnknownMosType(ArcStr),
    #[error("unknown threshold flavor: {0}")]
    UnknownThreshold(ArcStr),
    #[error("invalid number of fins: {0}")]
    InvalidNumFins(i64),
    #[error("guard_ring_nf = {nf} < {min}")]
    GuardRingTooSmall { nf: i64, min: i64 },
    #[error("stack = {stack} must evenly divide fg = {fg}")]
    StackNotDivisible { stack: i64, fg: i64 },
    #[error("differential connection not supported")]
    DifferentialUnsupported,
    #[error("cannot connect 1 finger transistor")]
    SingleFingerConnection,
    #[error("unsupported via w/h: ({w},{h})")]
    UnsupportedViaDims { w: i64, h: i64 },
    #[error("no via between {bot} and {top}")]
    UnknownVia { bot: ArcStr, top: ArcStr },
    #[error("unknown metal layer: {0}")]
    UnknownLayer(ArcStr),
    #[error("vertical DC current not supported")]
    VerticalDcCurrent,
    #[error("transistor row has no OD")]
    NoOd,
}
