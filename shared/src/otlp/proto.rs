//! Protobuf messages for OTLP trace export.
//!
//! Field numbers follow `opentelemetry/proto` v1. Only the messages reachable
//! from `ExportTraceServiceRequest` are defined; span links are not emitted and
//! are left out.

#![allow(clippy::pedantic)]
#![allow(missing_docs)]

pub mod common {
    //! Common OTLP types.
    pub mod v1 {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct AnyValue {
            #[prost(oneof = "any_value::Value", tags = "1, 2, 3, 4, 5, 6, 7")]
            pub value: Option<any_value::Value>,
        }

        pub mod any_value {
            #[derive(Clone, PartialEq, ::prost::Oneof)]
            pub enum Value {
                #[prost(string, tag = "1")]
                StringValue(String),
                #[prost(bool, tag = "2")]
                BoolValue(bool),
                #[prost(int64, tag = "3")]
                IntValue(i64),
                #[prost(double, tag = "4")]
                DoubleValue(f64),
                #[prost(message, tag = "5")]
                ArrayValue(super::ArrayValue),
                #[prost(message, tag = "6")]
                KvlistValue(super::KeyValueList),
                #[prost(bytes = "vec", tag = "7")]
                BytesValue(Vec<u8>),
            }
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ArrayValue {
            #[prost(message, repeated, tag = "1")]
            pub values: Vec<AnyValue>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct KeyValueList {
            #[prost(message, repeated, tag = "1")]
            pub values: Vec<KeyValue>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct KeyValue {
            #[prost(string, tag = "1")]
            pub key: String,
            #[prost(message, optional, tag = "2")]
            pub value: Option<AnyValue>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct InstrumentationScope {
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(string, tag = "2")]
            pub version: String,
            #[prost(message, repeated, tag = "3")]
            pub attributes: Vec<KeyValue>,
            #[prost(uint32, tag = "4")]
            pub dropped_attributes_count: u32,
        }
    }
}

pub mod resource {
    //! Resource types.
    pub mod v1 {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Resource {
            #[prost(message, repeated, tag = "1")]
            pub attributes: Vec<super::super::common::v1::KeyValue>,
            #[prost(uint32, tag = "2")]
            pub dropped_attributes_count: u32,
        }
    }
}

pub mod trace {
    //! Trace types.
    pub mod v1 {
        use super::super::common::v1::{InstrumentationScope, KeyValue};
        use super::super::resource::v1::Resource;

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ResourceSpans {
            #[prost(message, optional, tag = "1")]
            pub resource: Option<Resource>,
            #[prost(message, repeated, tag = "2")]
            pub scope_spans: Vec<ScopeSpans>,
            #[prost(string, tag = "3")]
            pub schema_url: String,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ScopeSpans {
            #[prost(message, optional, tag = "1")]
            pub scope: Option<InstrumentationScope>,
            #[prost(message, repeated, tag = "2")]
            pub spans: Vec<Span>,
            #[prost(string, tag = "3")]
            pub schema_url: String,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Span {
            #[prost(bytes = "vec", tag = "1")]
            pub trace_id: Vec<u8>,
            #[prost(bytes = "vec", tag = "2")]
            pub span_id: Vec<u8>,
            #[prost(string, tag = "3")]
            pub trace_state: String,
            #[prost(bytes = "vec", tag = "4")]
            pub parent_span_id: Vec<u8>,
            #[prost(fixed32, tag = "16")]
            pub flags: u32,
            #[prost(string, tag = "5")]
            pub name: String,
            #[prost(enumeration = "span::SpanKind", tag = "6")]
            pub kind: i32,
            #[prost(fixed64, tag = "7")]
            pub start_time_unix_nano: u64,
            #[prost(fixed64, tag = "8")]
            pub end_time_unix_nano: u64,
            #[prost(message, repeated, tag = "9")]
            pub attributes: Vec<KeyValue>,
            #[prost(uint32, tag = "10")]
            pub dropped_attributes_count: u32,
            #[prost(message, repeated, tag = "11")]
            pub events: Vec<span::Event>,
            #[prost(uint32, tag = "12")]
            pub dropped_events_count: u32,
            #[prost(uint32, tag = "14")]
            pub dropped_links_count: u32,
            #[prost(message, optional, tag = "15")]
            pub status: Option<Status>,
        }

        pub mod span {
            use super::KeyValue;

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct Event {
                #[prost(fixed64, tag = "1")]
                pub time_unix_nano: u64,
                #[prost(string, tag = "2")]
                pub name: String,
                #[prost(message, repeated, tag = "3")]
                pub attributes: Vec<KeyValue>,
                #[prost(uint32, tag = "4")]
                pub dropped_attributes_count: u32,
            }

            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
            #[repr(i32)]
            pub enum SpanKind {
                Unspecified = 0,
                Internal = 1,
                Server = 2,
                Client = 3,
                Producer = 4,
                Consumer = 5,
            }
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Status {
            #[prost(string, tag = "2")]
            pub message: String,
            #[prost(enumeration = "status::StatusCode", tag = "3")]
            pub code: i32,
        }

        pub mod status {
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
            #[repr(i32)]
            pub enum StatusCode {
                Unset = 0,
                Ok = 1,
                Error = 2,
            }
        }
    }
}

pub mod collector {
    //! Collector service messages.
    pub mod trace {
        //! Trace collector service.
        pub mod v1 {
            use super::super::super::trace::v1::ResourceSpans;

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ExportTraceServiceRequest {
                #[prost(message, repeated, tag = "1")]
                pub resource_spans: Vec<ResourceSpans>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ExportTraceServiceResponse {
                #[prost(message, optional, tag = "1")]
                pub partial_success: Option<ExportTracePartialSuccess>,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct ExportTracePartialSuccess {
                #[prost(int64, tag = "1")]
                pub rejected_spans: i64,
                #[prost(string, tag = "2")]
                pub error_message: String,
            }
        }
    }
}
