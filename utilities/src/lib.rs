pub mod tcp_link;
