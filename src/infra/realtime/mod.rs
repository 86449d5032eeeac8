pub mod sse_broadcaster;
