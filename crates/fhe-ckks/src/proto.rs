//! Protobuf messages for the CKKS objects that can be persisted.

#[derive(Clone, PartialEq, prost::Message)]
pub(crate) struct CiphertextProto {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub c: Vec<Vec<u8>>,
    #[prost(double, tag = "2")]
    pub scale: f64,
    #[prost(uint32, tag = "3")]
    pub level: u32,
}
